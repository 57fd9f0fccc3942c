//! The five reference scenarios a complete implementation must
//! reproduce: straight-line addition, a bounded summation loop, an
//! overflow-prone control loop, an indirect-load error, and a pruned
//! division-by-zero path.
//!
//! Programs are built directly as `Vec<(addr, Instruction)>` — there's
//! no assembler front-end in this crate, by design.

use branchwright::actl::{check, Atom, Formula, Proof, Term};
use branchwright::config::EngineConfig;
use branchwright::engine::run;
use branchwright::isa::{encode, Context, Instruction, Solution};
use branchwright::key::{Flag, Key, RegId};
use branchwright::smt::SolverDriver;
use branchwright::sym::Sym;
use branchwright::CoreError;

fn load(ctx: &mut Context, program: &[Instruction]) {
    for (i, instr) in program.iter().enumerate() {
        ctx.write(Key::Prog(i as i32), Sym::int(encode(*instr) as i32));
    }
    ctx.write(Key::Ic, Sym::zero());
}

#[test]
fn addition_scenario_produces_one_leaf_equal_to_the_free_variable() {
    // Set r0 0; Add r0 @x; Halt, with Addr(@x) = Var "x", -10 <= x <= 10.
    let mut ctx = Context::new();
    ctx.write(Key::Addr(0), Sym::var("x"));
    ctx.declare_free_var("x", Sym::var("x"));
    ctx.add_constraint("x_lower", Sym::gt(Sym::var("x"), Sym::int(-11)));
    ctx.add_constraint("x_upper", Sym::lt(Sym::var("x"), Sym::int(11)));
    load(
        &mut ctx,
        &[
            Instruction::Set { r: RegId(0), imm: 0 },
            Instruction::Add { r: RegId(0), a: 0 },
            Instruction::Halt,
        ],
    );

    let (trace, _stats) = run(ctx, &EngineConfig::default()).unwrap();
    let leaves: Vec<_> = trace.leaf_contexts().collect();
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].1.read(Key::Reg(RegId(0))), Sym::var("x"));

    let driver = SolverDriver::new(5_000);
    let atom = Atom::Eq(Term::Key(Key::Reg(RegId(0))), Term::Key(Key::Addr(0)));
    assert_eq!(check(&Formula::AllG(atom), &trace, &driver).unwrap(), Proof::Proved);
}

#[test]
fn sum_loop_forks_once_per_feasible_value_of_n() {
    // r0 := 0 (accumulator), r1 := n (free, 1 <= n <= 5): while r1 != 0
    // { r0 += r1; r1 -= 1 }. Every loop check forks on the
    // still-symbolic counter, but the solver prunes each child whose
    // accumulated path condition pins n outside [1, 5] or contradicts
    // an earlier "not yet zero" branch, leaving exactly one surviving
    // leaf per feasible value of n.
    let mut ctx = Context::new();
    ctx.write(Key::Reg(RegId(1)), Sym::var("n"));
    ctx.declare_free_var("n", Sym::var("n"));
    ctx.add_constraint("n_lower", Sym::gt(Sym::var("n"), Sym::int(0)));
    ctx.add_constraint("n_upper", Sym::lt(Sym::var("n"), Sym::int(6)));
    ctx.write(Key::Addr(10), Sym::zero()); // zero sentinel for CmpEq
    load(
        &mut ctx,
        &[
            Instruction::CmpEq { r: RegId(1), a: 10 }, // 0: Condition := r1 == 0
            Instruction::JumpCt { imm: 4 },             // 1: -> idx 6 (Halt) once done
            Instruction::Store { r: RegId(1), a: 11 },  // 2: stash r1 so Add can read it
            Instruction::Add { r: RegId(0), a: 11 },    // 3: r0 += r1
            Instruction::SubI { r: RegId(1), imm: 1 },  // 4: r1 -= 1
            Instruction::Jump { imm: -6 },               // 5: -> idx 0
            Instruction::Halt,                           // 6
        ],
    );
    let (trace, stats) = run(ctx, &EngineConfig::default()).unwrap();
    let leaves: Vec<_> = trace.leaf_contexts().collect();
    assert_eq!(leaves.len(), 5, "one surviving leaf per feasible n in 1..=5");
    assert_eq!(stats.leaves_produced, 5);

    let driver = SolverDriver::new(5_000);
    for (_, leaf) in &leaves {
        let mut probe = (*leaf).clone();
        driver.check_context(&mut probe).unwrap();
        let n = match &probe.solution {
            Solution::Satisfiable(model) => *model.get("n").unwrap(),
            other => panic!("expected a witnessing model for n, got {other:?}"),
        };
        let expected = n * (n + 1) / 2;

        // r0 must equal n*(n+1)/2 on every model consistent with this
        // leaf's path condition — confirmed the same way `actl::check`
        // confirms a property: the negation, conjoined with the path
        // condition, must be unsatisfiable.
        let mut confirm = (*leaf).clone();
        confirm.path_condition = Sym::and(
            confirm.path_condition,
            Sym::not(Sym::eq(confirm.read(Key::Reg(RegId(0))), Sym::int(expected))),
        );
        driver.check_context(&mut confirm).unwrap();
        assert!(confirm.solution.is_unsat(), "r0 must equal n*(n+1)/2 = {expected} for n = {n}");
    }
}

#[test]
fn motor_control_overflow_is_falsifiable_with_a_witnessing_model() {
    // r0 := speed (free, unconstrained); r0 *= r0 (squaring a motor
    // command is exactly the kind of operation that overflows Int32
    // for large magnitudes); Halt. AllG(Overflow = false) must be
    // falsifiable, with a counterexample assigning speed a value whose
    // square overflows.
    let mut ctx = Context::new();
    ctx.write(Key::Addr(0), Sym::int(i32::MAX));
    load(
        &mut ctx,
        &[
            Instruction::Set { r: RegId(0), imm: 1 },
            Instruction::Load { r: RegId(1), a: 0 },
            Instruction::Mul { r: RegId(1), a: 0 },
            Instruction::Halt,
        ],
    );
    let (trace, _stats) = run(ctx, &EngineConfig::default()).unwrap();
    let driver = SolverDriver::new(5_000);
    let atom = Atom::Eq(Term::Key(Key::F(Flag::Overflow)), Term::Bool(false));
    match check(&Formula::AllG(atom), &trace, &driver).unwrap() {
        Proof::Falsifiable { .. } => {}
        Proof::Proved => panic!("expected the overflow property to be falsifiable"),
    }
}

#[test]
fn load_mi_through_an_unconstrained_pointer_is_fatal_but_a_constrained_one_succeeds() {
    let mut unconstrained = Context::new();
    unconstrained.write(Key::Addr(0), Sym::var("p"));
    load(&mut unconstrained, &[Instruction::LoadMi { r: RegId(0), p: 0 }]);
    let err = run(unconstrained, &EngineConfig::default()).unwrap_err();
    assert!(matches!(err, CoreError::InvalidIndirectAddress(_)));

    let mut constrained = Context::new();
    constrained.write(Key::Addr(0), Sym::int(42));
    constrained.write(Key::Addr(42), Sym::int(7));
    load(&mut constrained, &[Instruction::LoadMi { r: RegId(0), p: 0 }, Instruction::Halt]);
    let (trace, _stats) = run(constrained, &EngineConfig::default()).unwrap();
    let leaves: Vec<_> = trace.leaf_contexts().collect();
    assert_eq!(leaves.len(), 1);
    assert_eq!(leaves[0].1.read(Key::Reg(RegId(0))), Sym::int(7));
}

#[test]
fn division_by_zero_prune_is_falsifiable_with_y_equal_to_zero() {
    // Div r0 @y, y unconstrained: F.DivisionByZero is reachable, so
    // AllG(F.DivisionByZero = false) must be falsifiable with y = 0.
    let mut ctx = Context::new();
    ctx.write(Key::Reg(RegId(0)), Sym::int(10));
    ctx.write(Key::Addr(0), Sym::var("y"));
    ctx.declare_free_var("y", Sym::var("y"));
    load(&mut ctx, &[Instruction::Div { r: RegId(0), a: 0 }, Instruction::Halt]);
    let (trace, _stats) = run(ctx, &EngineConfig::default()).unwrap();

    let driver = SolverDriver::new(5_000);
    let atom = Atom::Eq(Term::Key(Key::F(Flag::DivisionByZero)), Term::Bool(false));
    match check(&Formula::AllG(atom), &trace, &driver).unwrap() {
        Proof::Falsifiable { counterexample, .. } => {
            assert_eq!(counterexample.get("y"), Some(&0));
        }
        Proof::Proved => panic!("expected the division-by-zero property to be falsifiable"),
    }
}
