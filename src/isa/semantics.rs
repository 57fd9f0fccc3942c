//! Per-opcode semantic clauses (§4.D).
//!
//! [`execute`] runs one already-fetched instruction against a
//! `Context` and reports how control should move on: straight-line
//! advance, halt, an unconditional jump, or a guarded jump whose
//! polarity the engine must resolve with [`crate::isa::effect::decide`]
//! (forking the execution tree when the guard doesn't concretize).
//!
//! Division and modulo never fork or trap on their own: `F.DivisionByZero`
//! records whether the divisor is (possibly symbolically) zero, and the
//! quotient/remainder is written as an unevaluated `Div`/`Mod` node rather
//! than being forced to a concrete value (§4.D). A caller that reaches
//! into that node with `get_value`/`simplify` on a path where the divisor
//! really is zero gets the fatal `DivisionByZeroReached` case in §7 —
//! something a verifier checking `F.DivisionByZero = false` is meant to
//! rule out before it happens.

use crate::concrete::Concrete;
use crate::error::CoreResult;
use crate::isa::context::Context;
use crate::isa::encoding::Instruction;
use crate::key::{Flag, Key};
use crate::sym::Sym;

/// How a step affects control flow. Non-branching opcodes always
/// report `Advance`; `Halt` stops the step loop; `Jump` and `CondJump`
/// carry enough information for the engine to update the instruction
/// counter (forking for `CondJump` when the guard is unresolved).
#[derive(Clone, Debug, PartialEq)]
pub enum Control {
    Advance,
    Halt,
    Jump(i16),
    CondJump { guard: Sym, taken_if: bool, imm: i16 },
}

pub fn execute(instr: Instruction, ctx: &mut Context) -> CoreResult<Control> {
    use Instruction::*;
    Ok(match instr {
        Halt => {
            ctx.write(Key::F(Flag::Halted), Sym::bool(true));
            Control::Halt
        }
        Load { r, a } => {
            let v = ctx.read(Key::Addr(a));
            ctx.write(Key::Reg(r), v);
            Control::Advance
        }
        LoadMi { r, p } => {
            let pointer = ctx.read(Key::Addr(p));
            match crate::sym::to_concrete_address(&pointer)? {
                Ok(addr) => {
                    let v = ctx.read(Key::Addr(addr));
                    ctx.write(Key::Reg(r), v);
                }
                Err(unresolved) => {
                    return Err(crate::error::CoreError::InvalidIndirectAddress(unresolved));
                }
            }
            Control::Advance
        }
        Set { r, imm } => {
            ctx.write(Key::Reg(r), Sym::int(imm as i32));
            Control::Advance
        }
        Store { r, a } => {
            let v = ctx.read(Key::Reg(r));
            ctx.write(Key::Addr(a), v);
            Control::Advance
        }
        Add { r, a } => {
            arith(ctx, r, Key::Addr(a), Sym::add, add_overflows)?;
            Control::Advance
        }
        Sub { r, a } => {
            arith(ctx, r, Key::Addr(a), Sym::sub, sub_overflows)?;
            Control::Advance
        }
        Mul { r, a } => {
            arith(ctx, r, Key::Addr(a), Sym::mul, mul_overflows)?;
            Control::Advance
        }
        AddI { r, imm } => {
            arith_imm(ctx, r, imm, Sym::add, add_overflows)?;
            Control::Advance
        }
        SubI { r, imm } => {
            arith_imm(ctx, r, imm, Sym::sub, sub_overflows)?;
            Control::Advance
        }
        Div { r, a } => {
            divide(ctx, r, Key::Addr(a), Sym::div)?;
            Control::Advance
        }
        Mod { r, a } => {
            divide(ctx, r, Key::Addr(a), Sym::rem)?;
            Control::Advance
        }
        Abs { r } => {
            let reg = ctx.read(Key::Reg(r));
            let overflowed = abs_overflows(&reg)?;
            ctx.write(Key::F(Flag::Overflow), overflowed);
            let result = Sym::abs(reg).simplify(crate::sym::DEFAULT_SIMPLIFY_STEPS)?;
            ctx.write(Key::Reg(r), result);
            Control::Advance
        }
        CmpEq { r, a } => {
            compare(ctx, r, a, Sym::eq)?;
            Control::Advance
        }
        CmpGt { r, a } => {
            compare(ctx, r, a, Sym::gt)?;
            Control::Advance
        }
        CmpLt { r, a } => {
            compare(ctx, r, a, Sym::lt)?;
            Control::Advance
        }
        Jump { imm } => Control::Jump(imm),
        JumpCt { imm } => Control::CondJump {
            guard: ctx.read(Key::F(Flag::Condition)),
            taken_if: true,
            imm,
        },
        JumpCf { imm } => Control::CondJump {
            guard: ctx.read(Key::F(Flag::Condition)),
            taken_if: false,
            imm,
        },
    })
}

fn arith(
    ctx: &mut Context,
    r: crate::key::RegId,
    mem: Key,
    combine: fn(Sym, Sym) -> Sym,
    overflows: fn(&Sym, &Sym) -> CoreResult<Sym>,
) -> CoreResult<()> {
    let lhs = ctx.read(Key::Reg(r));
    let rhs = ctx.read(mem);
    let overflowed = overflows(&lhs, &rhs)?;
    ctx.write(Key::F(Flag::Overflow), overflowed);
    let result = combine(lhs, rhs).simplify(crate::sym::DEFAULT_SIMPLIFY_STEPS)?;
    ctx.write(Key::Reg(r), result);
    Ok(())
}

fn arith_imm(
    ctx: &mut Context,
    r: crate::key::RegId,
    imm: i8,
    combine: fn(Sym, Sym) -> Sym,
    overflows: fn(&Sym, &Sym) -> CoreResult<Sym>,
) -> CoreResult<()> {
    let lhs = ctx.read(Key::Reg(r));
    let rhs = Sym::int(imm as i32);
    let overflowed = overflows(&lhs, &rhs)?;
    ctx.write(Key::F(Flag::Overflow), overflowed);
    let result = combine(lhs, rhs).simplify(crate::sym::DEFAULT_SIMPLIFY_STEPS)?;
    ctx.write(Key::Reg(r), result);
    Ok(())
}

/// Never forces concretization of the quotient itself — doing so would
/// trap on a concretely-zero divisor. `F.DivisionByZero` carries the
/// guard the solver is expected to prune on (§4.D, §8 scenario); the
/// written register stays an unevaluated `Div`/`Mod` node until
/// something downstream asks for its value.
fn divide(
    ctx: &mut Context,
    r: crate::key::RegId,
    mem: Key,
    combine: fn(Sym, Sym) -> Sym,
) -> CoreResult<()> {
    let lhs = ctx.read(Key::Reg(r));
    let rhs = ctx.read(mem);
    let is_zero = Sym::eq(rhs.clone(), Sym::zero()).simplify(crate::sym::DEFAULT_SIMPLIFY_STEPS)?;
    ctx.write(Key::F(Flag::DivisionByZero), is_zero);
    let overflowed = div_overflows(&lhs, &rhs)?;
    ctx.write(Key::F(Flag::Overflow), overflowed);
    ctx.write(Key::Reg(r), combine(lhs, rhs));
    Ok(())
}

fn compare(
    ctx: &mut Context,
    r: crate::key::RegId,
    a: i32,
    op: fn(Sym, Sym) -> Sym,
) -> CoreResult<()> {
    let lhs = ctx.read(Key::Reg(r));
    let rhs = ctx.read(Key::Addr(a));
    let cond = op(lhs, rhs).simplify(crate::sym::DEFAULT_SIMPLIFY_STEPS)?;
    ctx.write(Key::F(Flag::Condition), cond);
    Ok(())
}

/// Overflow predicates (§4.D). Exact when both operands concretize;
/// otherwise reported as `false` — a modelled limitation noted in
/// DESIGN.md, since the symbolic algebra has no dedicated bit-width
/// overflow primitive to build an equivalent guard from.
fn add_overflows(a: &Sym, b: &Sym) -> CoreResult<Sym> {
    both_concrete_int(a, b, i32::checked_add)
}

fn sub_overflows(a: &Sym, b: &Sym) -> CoreResult<Sym> {
    both_concrete_int(a, b, i32::checked_sub)
}

fn mul_overflows(a: &Sym, b: &Sym) -> CoreResult<Sym> {
    both_concrete_int(a, b, i32::checked_mul)
}

/// `x = minBound ∧ y = -1` (§4.D) — the one signed-division input pair
/// that overflows Int32 rather than trapping on a zero divisor, which
/// is tracked separately by `F.DivisionByZero`.
fn div_overflows(a: &Sym, b: &Sym) -> CoreResult<Sym> {
    match (a.get_value()?, b.get_value()?) {
        (Some(x), Some(y)) => {
            let (x, y) = (x.as_i32()?, y.as_i32()?);
            Ok(Sym::bool(x == i32::MIN && y == -1))
        }
        _ => Ok(Sym::bool(false)),
    }
}

fn abs_overflows(a: &Sym) -> CoreResult<Sym> {
    match a.get_value()? {
        Some(Concrete::Int32(i)) => Ok(Sym::bool(i == i32::MIN)),
        _ => Ok(Sym::bool(false)),
    }
}

fn both_concrete_int(
    a: &Sym,
    b: &Sym,
    checked: fn(i32, i32) -> Option<i32>,
) -> CoreResult<Sym> {
    match (a.get_value()?, b.get_value()?) {
        (Some(x), Some(y)) => {
            let (x, y) = (x.as_i32()?, y.as_i32()?);
            Ok(Sym::bool(checked(x, y).is_none()))
        }
        _ => Ok(Sym::bool(false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::RegId;

    #[test]
    fn load_then_store_round_trips_through_memory() {
        let mut ctx = Context::new();
        ctx.write(Key::Addr(0), Sym::int(9));
        execute(Instruction::Load { r: RegId(0), a: 0 }, &mut ctx).unwrap();
        assert_eq!(ctx.read(Key::Reg(RegId(0))), Sym::int(9));
        execute(Instruction::Store { r: RegId(0), a: 1 }, &mut ctx).unwrap();
        assert_eq!(ctx.read(Key::Addr(1)), Sym::int(9));
    }

    #[test]
    fn add_sets_register_and_overflow_flag() {
        let mut ctx = Context::new();
        ctx.write(Key::Reg(RegId(0)), Sym::int(i32::MAX));
        ctx.write(Key::Addr(0), Sym::int(1));
        execute(Instruction::Add { r: RegId(0), a: 0 }, &mut ctx).unwrap();
        assert_eq!(ctx.read(Key::F(Flag::Overflow)), Sym::bool(true));
    }

    #[test]
    fn load_mi_follows_pointer_indirection() {
        let mut ctx = Context::new();
        ctx.write(Key::Addr(0), Sym::int(5));
        ctx.write(Key::Addr(5), Sym::int(77));
        execute(Instruction::LoadMi { r: RegId(0), p: 0 }, &mut ctx).unwrap();
        assert_eq!(ctx.read(Key::Reg(RegId(0))), Sym::int(77));
    }

    #[test]
    fn load_mi_through_unresolved_pointer_is_fatal() {
        let mut ctx = Context::new();
        ctx.write(Key::Addr(0), Sym::var("unbound_pointer"));
        let err = execute(Instruction::LoadMi { r: RegId(0), p: 0 }, &mut ctx).unwrap_err();
        assert!(matches!(err, crate::error::CoreError::InvalidIndirectAddress(_)));
    }

    #[test]
    fn concrete_zero_divisor_sets_the_flag_without_trapping() {
        let mut ctx = Context::new();
        ctx.write(Key::Reg(RegId(0)), Sym::int(10));
        ctx.write(Key::Addr(0), Sym::zero());
        execute(Instruction::Div { r: RegId(0), a: 0 }, &mut ctx).unwrap();
        assert_eq!(ctx.read(Key::F(Flag::DivisionByZero)), Sym::bool(true));
    }

    #[test]
    fn forcing_a_concretely_zero_quotient_is_fatal() {
        // The register now holds an unevaluated `Div` node; asking for its
        // value is the "should be unreachable given pruning" case (§7).
        let mut ctx = Context::new();
        ctx.write(Key::Reg(RegId(0)), Sym::int(10));
        ctx.write(Key::Addr(0), Sym::zero());
        execute(Instruction::Div { r: RegId(0), a: 0 }, &mut ctx).unwrap();
        let quotient = ctx.read(Key::Reg(RegId(0)));
        assert!(quotient.get_value().is_err());
    }

    #[test]
    fn symbolic_divisor_leaves_a_deferred_division_by_zero_flag() {
        let mut ctx = Context::new();
        ctx.write(Key::Reg(RegId(0)), Sym::int(10));
        ctx.write(Key::Addr(0), Sym::var("d"));
        execute(Instruction::Div { r: RegId(0), a: 0 }, &mut ctx).unwrap();
        assert_ne!(ctx.read(Key::F(Flag::DivisionByZero)), Sym::bool(false));
    }

    #[test]
    fn jump_ct_reports_guard_for_the_engine_to_resolve() {
        let mut ctx = Context::new();
        ctx.write(Key::F(Flag::Condition), Sym::var("cond"));
        let control = execute(Instruction::JumpCt { imm: 4 }, &mut ctx).unwrap();
        match control {
            Control::CondJump { taken_if, imm, .. } => {
                assert!(taken_if);
                assert_eq!(imm, 4);
            }
            other => panic!("expected CondJump, got {other:?}"),
        }
    }

    #[test]
    fn halt_sets_the_halted_flag() {
        let mut ctx = Context::new();
        execute(Instruction::Halt, &mut ctx).unwrap();
        assert!(ctx.is_halted());
    }
}
