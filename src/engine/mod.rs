//! Forking symbolic execution engine (§4.F).
//!
//! Drives the fetch/increment/decode/execute cycle over a
//! [`crate::tree::Tree`]: each leaf context is stepped until it halts,
//! exhausts its step budget, or reaches a conditional jump whose guard
//! doesn't concretize — at which point the leaf is replaced by a
//! `Branch` and both successor contexts are queued, each first checked
//! against the solver so a child whose path condition is already
//! unsatisfiable is pruned rather than explored further (§1, §2, §4.F).
//! The result is a [`Trace`]: the tree's shape plus the `Context`
//! attached to each node the engine actually recorded.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::concrete::Concrete;
use crate::config::EngineConfig;
use crate::error::{CoreError, CoreResult};
use crate::isa::{decide, decode, execute, Context, Control, Decision};
use crate::key::Key;
use crate::smt::SolverDriver;
use crate::sym::{to_instruction_code, Sym};
use crate::tree::{NodeId, Tree};

/// Shape plus payload: the tree records how execution forked, the map
/// holds the `Context` observed on arrival at every node that has been
/// visited — not only the current frontier — so the ACTL checker (§4.H)
/// can walk whole paths, not just endpoints.
#[derive(Clone, Debug, Default)]
pub struct Trace {
    pub tree: Tree,
    pub contexts: HashMap<NodeId, Context>,
}

impl Trace {
    pub fn leaf_contexts(&self) -> impl Iterator<Item = (NodeId, &Context)> {
        self.tree
            .leafs()
            .into_iter()
            .filter_map(move |id| self.contexts.get(&id).map(|ctx| (id, ctx)))
    }

    pub fn context_at(&self, node: NodeId) -> Option<&Context> {
        self.contexts.get(&node)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SymExecStats {
    pub elapsed: Duration,
    pub steps_taken: u64,
    pub leaves_produced: u64,
}

enum StepResult {
    Continue(Context),
    Halted(Context),
    Fork(Context, Context),
}

fn current_ic(ctx: &Context) -> CoreResult<i32> {
    let ic_sym = ctx.read(Key::Ic);
    match ic_sym.get_value()? {
        Some(Concrete::Int32(i)) => Ok(i),
        _ => Err(CoreError::SymbolicIc(ic_sym)),
    }
}

fn step(mut ctx: Context, cfg: &EngineConfig) -> CoreResult<StepResult> {
    let ic = current_ic(&ctx)?;
    let code_sym = ctx.read(Key::Prog(ic));
    let code = match to_instruction_code(&code_sym)? {
        Ok(c) => c,
        Err(unresolved) => {
            return Err(CoreError::TypeError(format!(
                "program memory at {ic} is symbolic: {unresolved}"
            )))
        }
    };
    let instr = decode(code).ok_or(CoreError::UnknownOpcode(code))?;
    ctx.write(Key::Ir, Sym::int(code as i32));
    ctx.write(Key::Ic, Sym::int(ic + 1));

    match execute(instr, &mut ctx)? {
        Control::Advance => Ok(StepResult::Continue(ctx)),
        Control::Halt => Ok(StepResult::Halted(ctx)),
        Control::Jump(imm) => {
            ctx.write(Key::Ic, Sym::int(ic + 1 + imm as i32));
            Ok(StepResult::Continue(ctx))
        }
        Control::CondJump { guard, taken_if, imm } => match decide(&guard)? {
            Decision::Concrete(b) => {
                if b == taken_if {
                    ctx.write(Key::Ic, Sym::int(ic + 1 + imm as i32));
                }
                Ok(StepResult::Continue(ctx))
            }
            Decision::Fork => {
                let taken_guard = if taken_if { guard.clone() } else { Sym::not(guard.clone()) };
                let not_taken_guard = if taken_if { Sym::not(guard) } else { guard };

                let mut taken = ctx.clone();
                taken.path_condition =
                    Sym::and(taken.path_condition.clone(), taken_guard).simplify(cfg.simplify_steps)?;
                taken.write(Key::Ic, Sym::int(ic + 1 + imm as i32));

                let mut not_taken = ctx;
                not_taken.path_condition = Sym::and(not_taken.path_condition.clone(), not_taken_guard)
                    .simplify(cfg.simplify_steps)?;

                Ok(StepResult::Fork(taken, not_taken))
            }
        },
    }
}

/// Run to completion: every leaf either halts or exhausts its step
/// budget. Node IDs are assigned in the order `insert1`/`insert2`
/// create them, giving a stable pre-order numbering regardless of the
/// worklist's pop order (property 7).
pub fn run(initial: Context, cfg: &EngineConfig) -> CoreResult<(Trace, SymExecStats)> {
    let started = Instant::now();
    let mut stats = SymExecStats::default();
    let driver = SolverDriver::new(cfg.solver_timeout_ms);
    let tree = Tree::new();
    let root = tree.root();
    let mut trace = Trace { tree, contexts: HashMap::new() };
    let mut worklist = vec![(root, initial, 0u64)];

    while let Some((node, ctx, steps_so_far)) = worklist.pop() {
        if ctx.is_halted() || steps_so_far >= cfg.step_budget {
            trace.contexts.insert(node, ctx);
            stats.leaves_produced += 1;
            continue;
        }
        // Record the state observed on arrival at this node, even though
        // it's about to step further — the ACTL checker walks every node,
        // not just the frontier (§4.H).
        trace.contexts.insert(node, ctx.clone());
        stats.steps_taken += 1;
        match step(ctx, cfg)? {
            StepResult::Halted(ctx) => {
                trace.contexts.insert(node, ctx);
                stats.leaves_produced += 1;
            }
            StepResult::Continue(ctx) => {
                let child = trace.tree.insert1(node);
                worklist.push((child, ctx, steps_so_far + 1));
            }
            StepResult::Fork(mut taken, mut not_taken) => {
                let (taken_id, not_taken_id) = trace.tree.insert2(node);
                // Each child's path condition was just extended with its
                // branch guard; solve before exploring further so a
                // child that is already unsatisfiable is pruned here
                // rather than stepped to a leaf that can never be
                // reached (§1, §2, §4.F).
                driver.check_context(&mut taken)?;
                if !taken.solution.is_unsat() {
                    worklist.push((taken_id, taken, steps_so_far + 1));
                }
                driver.check_context(&mut not_taken)?;
                if !not_taken.solution.is_unsat() {
                    worklist.push((not_taken_id, not_taken, steps_so_far + 1));
                }
            }
        }
    }

    stats.elapsed = started.elapsed();
    Ok((trace, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::encode;
    use crate::isa::Instruction;
    use crate::key::RegId;

    fn load_program(ctx: &mut Context, program: &[Instruction]) {
        for (i, instr) in program.iter().enumerate() {
            ctx.write(Key::Prog(i as i32), Sym::int(encode(*instr) as i32));
        }
        ctx.write(Key::Ic, Sym::zero());
    }

    #[test]
    fn addition_scenario_halts_with_the_expected_sum() {
        let mut ctx = Context::new();
        ctx.write(Key::Addr(0), Sym::int(2));
        ctx.write(Key::Addr(1), Sym::int(3));
        load_program(
            &mut ctx,
            &[
                Instruction::Load { r: RegId(0), a: 0 },
                Instruction::Add { r: RegId(0), a: 1 },
                Instruction::Store { r: RegId(0), a: 2 },
                Instruction::Halt,
            ],
        );
        let (trace, _stats) = run(ctx, &EngineConfig::default()).unwrap();
        let leaves: Vec<_> = trace.leaf_contexts().collect();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].1.read(Key::Addr(2)), Sym::int(5));
    }

    #[test]
    fn symbolic_conditional_jump_forks_into_two_leaves() {
        let mut ctx = Context::new();
        ctx.write(Key::Reg(RegId(0)), Sym::var("x"));
        ctx.write(Key::Addr(0), Sym::zero());
        load_program(
            &mut ctx,
            &[
                Instruction::CmpGt { r: RegId(0), a: 0 },
                Instruction::JumpCt { imm: 1 },
                Instruction::Halt,
                Instruction::Halt,
            ],
        );
        let (trace, _stats) = run(ctx, &EngineConfig::default()).unwrap();
        assert_eq!(trace.leaf_contexts().count(), 2);
    }

    #[test]
    fn load_mi_through_unresolved_pointer_is_reported_not_panicked() {
        let mut ctx = Context::new();
        ctx.write(Key::Addr(0), Sym::var("unbound"));
        load_program(&mut ctx, &[Instruction::LoadMi { r: RegId(0), p: 0 }]);
        let err = run(ctx, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidIndirectAddress(_)));
    }

    #[test]
    fn step_budget_halts_a_non_terminating_program() {
        let mut ctx = Context::new();
        load_program(&mut ctx, &[Instruction::Jump { imm: -1 }]);
        let cfg = EngineConfig { step_budget: 50, ..EngineConfig::default() };
        let (trace, stats) = run(ctx, &cfg).unwrap();
        assert_eq!(trace.leaf_contexts().count(), 1);
        assert_eq!(stats.steps_taken, 50);
    }
}
