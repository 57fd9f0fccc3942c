//! ACTL — the universal fragment of branching-time logic — property
//! checking over a `Trace` (§4.H).
//!
//! A formula is built from atomic state predicates and two path
//! quantifiers: `AllG` ("on every path, this atom holds at every
//! node") and `AllF` ("on every path, this atom holds at some node").
//! Checking walks every node the engine actually visited — `Trace`
//! keeps a `Context` snapshot per node, not only the frontier, exactly
//! so this component can do that (§4.F).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::engine::Trace;
use crate::error::CoreResult;
use crate::isa::Context;
use crate::key::Key;
use crate::sym::Sym;
use crate::tree::NodeId;

/// A value read either from machine state or supplied as a constant,
/// the two things an atomic predicate compares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Term {
    Key(Key),
    Const(i32),
    /// A boolean constant — flags (`F.Overflow`, `F.DivisionByZero`, ...)
    /// read as `Sym::Bool`, so comparing one against `Const(0)` would hit
    /// `Concrete::eq_val`'s integer coercion and fail with a type error.
    Bool(bool),
}

fn resolve(term: &Term, ctx: &Context) -> Sym {
    match term {
        Term::Key(k) => ctx.read(*k),
        Term::Const(i) => Sym::int(*i),
        Term::Bool(b) => Sym::bool(*b),
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Atom {
    Eq(Term, Term),
    Gt(Term, Term),
    Lt(Term, Term),
    Not(Box<Atom>),
    And(Box<Atom>, Box<Atom>),
    Or(Box<Atom>, Box<Atom>),
}

/// Negation, pushed down through `And`/`Or` via De Morgan until it
/// reaches a comparison leaf, where it stops at a `Not` wrapper rather
/// than expanding into `Gt`/`Lt` — a `Term` may be a boolean flag, and
/// `Gt`/`Lt` are only meaningful over the integer terms a numeric
/// comparison promises.
pub fn negate(atom: &Atom) -> Atom {
    match atom {
        Atom::Eq(..) | Atom::Gt(..) | Atom::Lt(..) => Atom::Not(Box::new(atom.clone())),
        Atom::Not(a) => (**a).clone(),
        Atom::And(a, b) => Atom::Or(Box::new(negate(a)), Box::new(negate(b))),
        Atom::Or(a, b) => Atom::And(Box::new(negate(a)), Box::new(negate(b))),
    }
}

/// Evaluate an atom at one context, as a (possibly still symbolic)
/// boolean term.
pub fn eval_atom(atom: &Atom, ctx: &Context) -> CoreResult<Sym> {
    Ok(match atom {
        Atom::Eq(a, b) => Sym::eq(resolve(a, ctx), resolve(b, ctx)),
        Atom::Gt(a, b) => Sym::gt(resolve(a, ctx), resolve(b, ctx)),
        Atom::Lt(a, b) => Sym::lt(resolve(a, ctx), resolve(b, ctx)),
        Atom::Not(a) => Sym::not(eval_atom(a, ctx)?),
        Atom::And(a, b) => Sym::and(eval_atom(a, ctx)?, eval_atom(b, ctx)?),
        Atom::Or(a, b) => Sym::or(eval_atom(a, ctx)?, eval_atom(b, ctx)?),
    }
    .simplify(crate::sym::DEFAULT_SIMPLIFY_STEPS)?)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Formula {
    Atomic(Atom),
    AllG(Atom),
    AllF(Atom),
    And(Box<Formula>, Box<Formula>),
}

/// The outcome of checking one formula against a trace: either it
/// holds everywhere it was asked to, or the first violating node and
/// the counterexample model the solver found for it.
#[derive(Clone, Debug, PartialEq)]
pub enum Proof {
    Proved,
    Falsifiable {
        node: NodeId,
        counterexample: BTreeMap<String, i32>,
    },
}

fn path_to_root(trace: &Trace, mut node: NodeId) -> Vec<NodeId> {
    let mut path = vec![node];
    while let Some(parent) = trace.tree.get(node).parent {
        path.push(parent);
        node = parent;
    }
    path.reverse();
    path
}

/// Nodes along the root-to-`leaf` path, in order — one ACTL "path".
fn nodes_on_path(trace: &Trace, leaf: NodeId) -> Vec<NodeId> {
    path_to_root(trace, leaf)
}

/// Report the failing atom as unreachable-or-witnessed by asking the
/// solver whether the node's path condition conjoined with the atom's
/// negation is satisfiable; if it is, that model is the counterexample.
fn counterexample_for(
    atom: &Atom,
    ctx: &Context,
    driver: &crate::smt::SolverDriver,
) -> CoreResult<Option<BTreeMap<String, i32>>> {
    let mut probe = ctx.clone();
    let violated = eval_atom(&negate(atom), ctx)?;
    probe.path_condition = Sym::and(probe.path_condition, violated);
    driver.check_context(&mut probe)?;
    Ok(match probe.solution {
        crate::isa::Solution::Satisfiable(model) => Some(model),
        _ => None,
    })
}

/// Check a formula against every path the engine explored (root to
/// each frontier leaf). `AllG` demands the atom hold at every node on
/// every path; `AllF` demands it hold at some node on every path.
pub fn check(
    formula: &Formula,
    trace: &Trace,
    driver: &crate::smt::SolverDriver,
) -> CoreResult<Proof> {
    match formula {
        Formula::Atomic(atom) => {
            for leaf in trace.tree.leafs() {
                if let Some(ctx) = trace.context_at(leaf) {
                    if let Some(cx) = counterexample_for(atom, ctx, driver)? {
                        return Ok(Proof::Falsifiable { node: leaf, counterexample: cx });
                    }
                }
            }
            Ok(Proof::Proved)
        }
        Formula::AllG(atom) => {
            for leaf in trace.tree.leafs() {
                for node in nodes_on_path(trace, leaf) {
                    if let Some(ctx) = trace.context_at(node) {
                        if let Some(cx) = counterexample_for(atom, ctx, driver)? {
                            return Ok(Proof::Falsifiable { node, counterexample: cx });
                        }
                    }
                }
            }
            Ok(Proof::Proved)
        }
        Formula::AllF(atom) => {
            // One task per leaf only (§4.H) — unlike `AllG`, this never
            // walks ancestor nodes.
            for leaf in trace.tree.leafs() {
                if let Some(ctx) = trace.context_at(leaf) {
                    if let Some(cx) = counterexample_for(atom, ctx, driver)? {
                        return Ok(Proof::Falsifiable { node: leaf, counterexample: cx });
                    }
                }
            }
            Ok(Proof::Proved)
        }
        Formula::And(a, b) => match check(a, trace, driver)? {
            Proof::Proved => check(b, trace, driver),
            falsifiable => Ok(falsifiable),
        },
    }
}
