//! Instruction set and its encoding (§4.D, §6).
//!
//! The bit layout itself is opaque to the rest of the core — the
//! engine only ever calls [`decode`] — but it must round-trip
//! (`decode(encode(i)) == Some(i)`), which is what the external
//! assembler front-end (out of scope, §1) relies on.

use serde::{Deserialize, Serialize};

use crate::key::RegId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Halt,
    Load { r: RegId, a: i32 },
    LoadMi { r: RegId, p: i32 },
    Set { r: RegId, imm: i8 },
    Store { r: RegId, a: i32 },
    Add { r: RegId, a: i32 },
    Sub { r: RegId, a: i32 },
    Mul { r: RegId, a: i32 },
    Div { r: RegId, a: i32 },
    Mod { r: RegId, a: i32 },
    AddI { r: RegId, imm: i8 },
    SubI { r: RegId, imm: i8 },
    Abs { r: RegId },
    CmpEq { r: RegId, a: i32 },
    CmpGt { r: RegId, a: i32 },
    CmpLt { r: RegId, a: i32 },
    Jump { imm: i16 },
    JumpCt { imm: i16 },
    JumpCf { imm: i16 },
}

pub type InstructionCode = u16;

const OPCODE_SHIFT: u16 = 11;
const OPERAND_MASK: u16 = (1 << OPCODE_SHIFT) - 1;
const REG_SHIFT: u16 = 8;
const VAL_MASK: u16 = (1 << REG_SHIFT) - 1;

fn opcode_of(code: InstructionCode) -> u16 {
    code >> OPCODE_SHIFT
}

fn operand_of(code: InstructionCode) -> u16 {
    code & OPERAND_MASK
}

fn pack_reg_val(opcode: u16, r: RegId, val: u8) -> InstructionCode {
    (opcode << OPCODE_SHIFT) | ((r.0 as u16) << REG_SHIFT) | (val as u16 & VAL_MASK)
}

fn pack_reg(opcode: u16, r: RegId) -> InstructionCode {
    (opcode << OPCODE_SHIFT) | ((r.0 as u16) << REG_SHIFT)
}

fn pack_imm11(opcode: u16, imm: i16) -> InstructionCode {
    (opcode << OPCODE_SHIFT) | (imm as u16 & OPERAND_MASK)
}

fn unpack_reg_val(code: InstructionCode) -> (RegId, u8) {
    let operand = operand_of(code);
    let r = RegId((operand >> REG_SHIFT) as u8);
    let val = (operand & VAL_MASK) as u8;
    (r, val)
}

fn unpack_reg(code: InstructionCode) -> RegId {
    RegId((operand_of(code) >> REG_SHIFT) as u8)
}

fn unpack_imm11(code: InstructionCode) -> i16 {
    let bits = operand_of(code);
    // Sign-extend the low 11 bits.
    ((bits << 5) as i16) >> 5
}

pub fn encode(instr: Instruction) -> InstructionCode {
    match instr {
        Instruction::Halt => 0u16 << OPCODE_SHIFT,
        Instruction::Load { r, a } => pack_reg_val(1, r, a as u8),
        Instruction::LoadMi { r, p } => pack_reg_val(2, r, p as u8),
        Instruction::Set { r, imm } => pack_reg_val(3, r, imm as u8),
        Instruction::Store { r, a } => pack_reg_val(4, r, a as u8),
        Instruction::Add { r, a } => pack_reg_val(5, r, a as u8),
        Instruction::Sub { r, a } => pack_reg_val(6, r, a as u8),
        Instruction::Mul { r, a } => pack_reg_val(7, r, a as u8),
        Instruction::Div { r, a } => pack_reg_val(8, r, a as u8),
        Instruction::Mod { r, a } => pack_reg_val(9, r, a as u8),
        Instruction::AddI { r, imm } => pack_reg_val(10, r, imm as u8),
        Instruction::SubI { r, imm } => pack_reg_val(11, r, imm as u8),
        Instruction::Abs { r } => pack_reg(12, r),
        Instruction::CmpEq { r, a } => pack_reg_val(13, r, a as u8),
        Instruction::CmpGt { r, a } => pack_reg_val(14, r, a as u8),
        Instruction::CmpLt { r, a } => pack_reg_val(15, r, a as u8),
        Instruction::Jump { imm } => pack_imm11(16, imm),
        Instruction::JumpCt { imm } => pack_imm11(17, imm),
        Instruction::JumpCf { imm } => pack_imm11(18, imm),
    }
}

pub fn decode(code: InstructionCode) -> Option<Instruction> {
    let opcode = opcode_of(code);
    Some(match opcode {
        0 => Instruction::Halt,
        1 => {
            let (r, a) = unpack_reg_val(code);
            Instruction::Load { r, a: a as i8 as i32 }
        }
        2 => {
            let (r, p) = unpack_reg_val(code);
            Instruction::LoadMi { r, p: p as i8 as i32 }
        }
        3 => {
            let (r, imm) = unpack_reg_val(code);
            Instruction::Set { r, imm: imm as i8 }
        }
        4 => {
            let (r, a) = unpack_reg_val(code);
            Instruction::Store { r, a: a as i8 as i32 }
        }
        5 => {
            let (r, a) = unpack_reg_val(code);
            Instruction::Add { r, a: a as i8 as i32 }
        }
        6 => {
            let (r, a) = unpack_reg_val(code);
            Instruction::Sub { r, a: a as i8 as i32 }
        }
        7 => {
            let (r, a) = unpack_reg_val(code);
            Instruction::Mul { r, a: a as i8 as i32 }
        }
        8 => {
            let (r, a) = unpack_reg_val(code);
            Instruction::Div { r, a: a as i8 as i32 }
        }
        9 => {
            let (r, a) = unpack_reg_val(code);
            Instruction::Mod { r, a: a as i8 as i32 }
        }
        10 => {
            let (r, imm) = unpack_reg_val(code);
            Instruction::AddI { r, imm: imm as i8 }
        }
        11 => {
            let (r, imm) = unpack_reg_val(code);
            Instruction::SubI { r, imm: imm as i8 }
        }
        12 => Instruction::Abs { r: unpack_reg(code) },
        13 => {
            let (r, a) = unpack_reg_val(code);
            Instruction::CmpEq { r, a: a as i8 as i32 }
        }
        14 => {
            let (r, a) = unpack_reg_val(code);
            Instruction::CmpGt { r, a: a as i8 as i32 }
        }
        15 => {
            let (r, a) = unpack_reg_val(code);
            Instruction::CmpLt { r, a: a as i8 as i32 }
        }
        16 => Instruction::Jump { imm: unpack_imm11(code) },
        17 => Instruction::JumpCt { imm: unpack_imm11(code) },
        18 => Instruction::JumpCf { imm: unpack_imm11(code) },
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_sample_instructions() -> Vec<Instruction> {
        let r = RegId(3);
        vec![
            Instruction::Halt,
            Instruction::Load { r, a: 100 },
            Instruction::LoadMi { r, p: -5 },
            Instruction::Set { r, imm: -12 },
            Instruction::Store { r, a: 7 },
            Instruction::Add { r, a: 1 },
            Instruction::Sub { r, a: 2 },
            Instruction::Mul { r, a: 3 },
            Instruction::Div { r, a: 4 },
            Instruction::Mod { r, a: 5 },
            Instruction::AddI { r, imm: 9 },
            Instruction::SubI { r, imm: -9 },
            Instruction::Abs { r },
            Instruction::CmpEq { r, a: 1 },
            Instruction::CmpGt { r, a: 2 },
            Instruction::CmpLt { r, a: 3 },
            Instruction::Jump { imm: 500 },
            Instruction::JumpCt { imm: -500 },
            Instruction::JumpCf { imm: 1000 },
        ]
    }

    #[test]
    fn encode_decode_round_trips() {
        // Property 6.
        for instr in all_sample_instructions() {
            let code = encode(instr);
            assert_eq!(decode(code), Some(instr), "round-trip failed for {instr:?}");
        }
    }

    #[test]
    fn unknown_opcode_decodes_to_none() {
        let code = 31u16 << OPCODE_SHIFT;
        assert_eq!(decode(code), None);
    }
}
