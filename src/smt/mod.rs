//! SMT translation and solver driver (§4.G).
//!
//! Translates a `Context`'s obligations — free-variable definitions,
//! path condition, user constraints — into 32-bit bit-vector terms
//! and asks Z3 whether they're jointly satisfiable. Each query gets
//! its own `z3::Context`/`Solver` pair (queries don't share solver
//! state, so they're farmed out to a worker pool — §5) and a
//! wall-clock timeout; a query that times out resolves to
//! `Solution::Unknown` rather than blocking the caller.

use std::collections::BTreeMap;

use rayon::prelude::*;
use z3::ast::{Ast, Bool, BV};
use z3::SatResult;

use crate::concrete::Concrete;
use crate::error::{CoreError, CoreResult};
use crate::isa::{Context, Solution};
use crate::sym::Sym;

const BV_WIDTH: u32 = 32;

enum Val<'c> {
    Bv(BV<'c>),
    B(Bool<'c>),
}

fn as_bv<'c>(zctx: &'c z3::Context, s: &Sym) -> CoreResult<BV<'c>> {
    match translate(zctx, s)? {
        Val::Bv(bv) => Ok(bv),
        Val::B(_) => Err(CoreError::TypeError(format!("expected an integer term, got boolean: {s}"))),
    }
}

fn as_bool<'c>(zctx: &'c z3::Context, s: &Sym) -> CoreResult<Bool<'c>> {
    match translate(zctx, s)? {
        Val::B(b) => Ok(b),
        Val::Bv(_) => Err(CoreError::TypeError(format!("expected a boolean term, got integer: {s}"))),
    }
}

fn translate<'c>(zctx: &'c z3::Context, s: &Sym) -> CoreResult<Val<'c>> {
    Ok(match s {
        Sym::Const(Concrete::Int32(i)) => Val::Bv(BV::from_i64(zctx, *i as i64, BV_WIDTH)),
        Sym::Const(Concrete::Word16(w)) => Val::Bv(BV::from_i64(zctx, *w as i64, BV_WIDTH)),
        Sym::Const(Concrete::Bool(b)) => Val::B(Bool::from_bool(zctx, *b)),
        Sym::Var(name) => Val::Bv(BV::new_const(zctx, name.clone(), BV_WIDTH)),
        Sym::Pointer(a) => translate(zctx, a)?,
        Sym::Add(a, b) => Val::Bv(as_bv(zctx, a)?.bvadd(&as_bv(zctx, b)?)),
        Sym::Sub(a, b) => Val::Bv(as_bv(zctx, a)?.bvsub(&as_bv(zctx, b)?)),
        Sym::Mul(a, b) => Val::Bv(as_bv(zctx, a)?.bvmul(&as_bv(zctx, b)?)),
        Sym::Div(a, b) => Val::Bv(as_bv(zctx, a)?.bvsdiv(&as_bv(zctx, b)?)),
        Sym::Mod(a, b) => Val::Bv(as_bv(zctx, a)?.bvsrem(&as_bv(zctx, b)?)),
        Sym::Abs(a) => {
            let v = as_bv(zctx, a)?;
            let zero = BV::from_i64(zctx, 0, BV_WIDTH);
            Val::Bv(v.bvslt(&zero).ite(&v.bvneg(), &v))
        }
        Sym::Eq(a, b) => match (translate(zctx, a)?, translate(zctx, b)?) {
            (Val::Bv(x), Val::Bv(y)) => Val::B(x._eq(&y)),
            (Val::B(x), Val::B(y)) => Val::B(x._eq(&y)),
            _ => return Err(CoreError::TypeError(format!("sort mismatch in {s}"))),
        },
        Sym::Gt(a, b) => Val::B(as_bv(zctx, a)?.bvsgt(&as_bv(zctx, b)?)),
        Sym::Lt(a, b) => Val::B(as_bv(zctx, a)?.bvslt(&as_bv(zctx, b)?)),
        Sym::And(a, b) => Val::B(Bool::and(zctx, &[&as_bool(zctx, a)?, &as_bool(zctx, b)?])),
        Sym::Or(a, b) => Val::B(Bool::or(zctx, &[&as_bool(zctx, a)?, &as_bool(zctx, b)?])),
        Sym::Not(a) => Val::B(as_bool(zctx, a)?.not()),
        Sym::Ite(c, t, e) => {
            let c = as_bool(zctx, c)?;
            match (translate(zctx, t)?, translate(zctx, e)?) {
                (Val::Bv(t), Val::Bv(e)) => Val::Bv(c.ite(&t, &e)),
                (Val::B(t), Val::B(e)) => Val::B(c.ite(&t, &e)),
                _ => return Err(CoreError::TypeError(format!("sort mismatch in {s}"))),
            }
        }
    })
}

#[derive(Clone, Copy, Debug)]
pub struct SolverDriver {
    pub timeout_ms: u64,
}

impl SolverDriver {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    /// Decide satisfiability of one `Context`'s accumulated
    /// obligations, writing the verdict back into `ctx.solution`.
    /// Gets a fresh `z3::Context`/`Solver` — never shared across
    /// queries, so this is safe to call from any thread.
    pub fn check_context(&self, ctx: &mut Context) -> CoreResult<()> {
        let mut cfg = z3::Config::new();
        cfg.set_timeout_msec(self.timeout_ms);
        let zctx = z3::Context::new(&cfg);
        let solver = z3::Solver::new(&zctx);

        for (name, def) in &ctx.store {
            let var = BV::new_const(&zctx, name.clone(), BV_WIDTH);
            solver.assert(&var._eq(&as_bv(&zctx, def)?));
        }
        solver.assert(&as_bool(&zctx, &ctx.path_condition)?);
        for (_label, assertion) in &ctx.constraints {
            solver.assert(&as_bool(&zctx, assertion)?);
        }

        ctx.solution = match solver.check() {
            SatResult::Unsat => Solution::Unsatisfiable,
            SatResult::Unknown => Solution::Unknown,
            SatResult::Sat => match solver.get_model() {
                Some(model) => {
                    let mut assignment = BTreeMap::new();
                    for name in ctx.find_free_vars() {
                        let var = BV::new_const(&zctx, name.clone(), BV_WIDTH);
                        if let Some(value) = model.eval(&var, true) {
                            if let Some(i) = value.as_i64() {
                                assignment.insert(name, i as i32);
                            }
                        }
                    }
                    Solution::Satisfiable(assignment)
                }
                None => Solution::Unknown,
            },
        };
        Ok(())
    }

    /// Farm independent queries across a worker pool (§5). Each
    /// context is solved in isolation; a fatal translation error in
    /// one context doesn't abort the others.
    pub fn check_all(&self, contexts: &mut [Context]) -> Vec<CoreResult<()>> {
        contexts
            .par_iter_mut()
            .map(|ctx| self.check_context(ctx))
            .collect()
    }
}
