//! Machine key space (§3 `Key`, §4.B).
//!
//! A `Key` names one addressable location in a `Context`'s binding
//! store: a register, a data-memory cell, a program-memory slot, the
//! instruction counter/register, or a status flag.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The register file. Eight general-purpose registers, matching the
/// 3-bit register field in the instruction encoding (§6).
pub const NUM_REGS: u8 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegId(pub u8);

impl RegId {
    pub fn new(idx: u8) -> Option<RegId> {
        (idx < NUM_REGS).then_some(RegId(idx))
    }
}

impl fmt::Display for RegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Flag {
    Halted,
    Overflow,
    DivisionByZero,
    Condition,
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Flag::Halted => "Halted",
            Flag::Overflow => "Overflow",
            Flag::DivisionByZero => "DivisionByZero",
            Flag::Condition => "Condition",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    Reg(RegId),
    /// A concrete data-memory address.
    Addr(i32),
    /// A program-memory slot, holding an encoded instruction.
    Prog(i32),
    /// Instruction counter.
    Ic,
    /// Instruction register (holds the fetched, not-yet-decoded code).
    Ir,
    F(Flag),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Reg(r) => write!(f, "{r}"),
            Key::Addr(a) => write!(f, "@{a}"),
            Key::Prog(a) => write!(f, "prog[{a}]"),
            Key::Ic => write!(f, "IC"),
            Key::Ir => write!(f, "IR"),
            Key::F(flag) => write!(f, "F.{flag}"),
        }
    }
}
