//! Symbolic expression algebra (§4.A).
//!
//! `Sym` is the term language every `Context` binding, path condition,
//! and constraint is built from. Children are held behind `Rc` so that
//! simplification can share unchanged subterms instead of re-allocating
//! them (see the design notes on the symbolic ADT).

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::concrete::Concrete;
use crate::error::{CoreError, CoreResult};


#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sym {
    Const(Concrete),
    Var(String),
    Pointer(Rc<Sym>),
    Ite(Rc<Sym>, Rc<Sym>, Rc<Sym>),
    Add(Rc<Sym>, Rc<Sym>),
    Sub(Rc<Sym>, Rc<Sym>),
    Mul(Rc<Sym>, Rc<Sym>),
    Div(Rc<Sym>, Rc<Sym>),
    Mod(Rc<Sym>, Rc<Sym>),
    Abs(Rc<Sym>),
    Eq(Rc<Sym>, Rc<Sym>),
    Gt(Rc<Sym>, Rc<Sym>),
    Lt(Rc<Sym>, Rc<Sym>),
    And(Rc<Sym>, Rc<Sym>),
    Or(Rc<Sym>, Rc<Sym>),
    Not(Rc<Sym>),
}

impl Sym {
    pub fn int(i: i32) -> Sym {
        Sym::Const(Concrete::Int32(i))
    }

    pub fn word(w: u16) -> Sym {
        Sym::Const(Concrete::Word16(w))
    }

    pub fn bool(b: bool) -> Sym {
        Sym::Const(Concrete::Bool(b))
    }

    pub fn zero() -> Sym {
        Sym::int(0)
    }

    pub fn var(name: impl Into<String>) -> Sym {
        Sym::Var(name.into())
    }

    pub fn add(a: Sym, b: Sym) -> Sym {
        Sym::Add(Rc::new(a), Rc::new(b))
    }

    pub fn sub(a: Sym, b: Sym) -> Sym {
        Sym::Sub(Rc::new(a), Rc::new(b))
    }

    pub fn mul(a: Sym, b: Sym) -> Sym {
        Sym::Mul(Rc::new(a), Rc::new(b))
    }

    pub fn div(a: Sym, b: Sym) -> Sym {
        Sym::Div(Rc::new(a), Rc::new(b))
    }

    pub fn rem(a: Sym, b: Sym) -> Sym {
        Sym::Mod(Rc::new(a), Rc::new(b))
    }

    pub fn abs(a: Sym) -> Sym {
        Sym::Abs(Rc::new(a))
    }

    pub fn eq(a: Sym, b: Sym) -> Sym {
        Sym::Eq(Rc::new(a), Rc::new(b))
    }

    pub fn gt(a: Sym, b: Sym) -> Sym {
        Sym::Gt(Rc::new(a), Rc::new(b))
    }

    pub fn lt(a: Sym, b: Sym) -> Sym {
        Sym::Lt(Rc::new(a), Rc::new(b))
    }

    pub fn and(a: Sym, b: Sym) -> Sym {
        Sym::And(Rc::new(a), Rc::new(b))
    }

    pub fn or(a: Sym, b: Sym) -> Sym {
        Sym::Or(Rc::new(a), Rc::new(b))
    }

    pub fn not(a: Sym) -> Sym {
        Sym::Not(Rc::new(a))
    }

    pub fn is_const(&self) -> bool {
        matches!(self, Sym::Const(_))
    }

    fn children(&self) -> Vec<&Sym> {
        match self {
            Sym::Const(_) | Sym::Var(_) => vec![],
            Sym::Pointer(a) | Sym::Abs(a) | Sym::Not(a) => vec![a],
            Sym::Add(a, b)
            | Sym::Sub(a, b)
            | Sym::Mul(a, b)
            | Sym::Div(a, b)
            | Sym::Mod(a, b)
            | Sym::Eq(a, b)
            | Sym::Gt(a, b)
            | Sym::Lt(a, b)
            | Sym::And(a, b)
            | Sym::Or(a, b) => vec![a, b],
            Sym::Ite(c, t, e) => vec![c, t, e],
        }
    }

    /// Rewrite free occurrences of `Var(name)` to `replacement`. Structural
    /// on every other variant.
    pub fn subst(&self, name: &str, replacement: &Sym) -> Sym {
        match self {
            Sym::Var(n) if n == name => replacement.clone(),
            Sym::Var(_) | Sym::Const(_) => self.clone(),
            Sym::Pointer(a) => Sym::Pointer(Rc::new(a.subst(name, replacement))),
            Sym::Abs(a) => Sym::Abs(Rc::new(a.subst(name, replacement))),
            Sym::Not(a) => Sym::Not(Rc::new(a.subst(name, replacement))),
            Sym::Add(a, b) => Sym::add(a.subst(name, replacement), b.subst(name, replacement)),
            Sym::Sub(a, b) => Sym::sub(a.subst(name, replacement), b.subst(name, replacement)),
            Sym::Mul(a, b) => Sym::mul(a.subst(name, replacement), b.subst(name, replacement)),
            Sym::Div(a, b) => Sym::div(a.subst(name, replacement), b.subst(name, replacement)),
            Sym::Mod(a, b) => Sym::rem(a.subst(name, replacement), b.subst(name, replacement)),
            Sym::Eq(a, b) => Sym::eq(a.subst(name, replacement), b.subst(name, replacement)),
            Sym::Gt(a, b) => Sym::gt(a.subst(name, replacement), b.subst(name, replacement)),
            Sym::Lt(a, b) => Sym::lt(a.subst(name, replacement), b.subst(name, replacement)),
            Sym::And(a, b) => Sym::and(a.subst(name, replacement), b.subst(name, replacement)),
            Sym::Or(a, b) => Sym::or(a.subst(name, replacement), b.subst(name, replacement)),
            Sym::Ite(c, t, e) => Sym::Ite(
                Rc::new(c.subst(name, replacement)),
                Rc::new(t.subst(name, replacement)),
                Rc::new(e.subst(name, replacement)),
            ),
        }
    }

    /// Collect the names of every free `Var` occurring in this term.
    pub fn free_vars(&self, out: &mut std::collections::BTreeSet<String>) {
        if let Sym::Var(name) = self {
            out.insert(name.clone());
        }
        for child in self.children() {
            child.free_vars(out);
        }
    }

    /// Attempt full concretization. `Ok(Some(c))` iff the term has no
    /// `Var`, `Pointer`, or `Ite`. `Ok(None)` means some part is still
    /// symbolic. `Err` is the fatal division-by-zero case — should be
    /// unreachable in a properly pruned execution (§7).
    pub fn get_value(&self) -> CoreResult<Option<Concrete>> {
        let bin = |a: &Sym,
                   b: &Sym,
                   f: fn(Concrete, Concrete) -> CoreResult<Concrete>|
         -> CoreResult<Option<Concrete>> {
            match (a.get_value()?, b.get_value()?) {
                (Some(x), Some(y)) => Ok(Some(f(x, y)?)),
                _ => Ok(None),
            }
        };
        match self {
            Sym::Const(c) => Ok(Some(*c)),
            Sym::Var(_) | Sym::Pointer(_) | Sym::Ite(..) => Ok(None),
            Sym::Add(a, b) => bin(a, b, Concrete::add),
            Sym::Sub(a, b) => bin(a, b, Concrete::sub),
            Sym::Mul(a, b) => bin(a, b, Concrete::mul),
            Sym::Div(a, b) => match (a.get_value()?, b.get_value()?) {
                (Some(x), Some(y)) => match x.div(y) {
                    Ok(v) => Ok(Some(v)),
                    Err(CoreError::ConcreteDivByZero) => {
                        Err(CoreError::DivisionByZeroReached(self.clone()))
                    }
                    Err(e) => Err(e),
                },
                _ => Ok(None),
            },
            Sym::Mod(a, b) => match (a.get_value()?, b.get_value()?) {
                (Some(x), Some(y)) => match x.rem(y) {
                    Ok(v) => Ok(Some(v)),
                    Err(CoreError::ConcreteDivByZero) => {
                        Err(CoreError::DivisionByZeroReached(self.clone()))
                    }
                    Err(e) => Err(e),
                },
                _ => Ok(None),
            },
            Sym::Abs(a) => match a.get_value()? {
                Some(x) => Ok(Some(x.abs()?)),
                None => Ok(None),
            },
            Sym::Eq(a, b) => bin(a, b, Concrete::eq_val),
            Sym::Gt(a, b) => bin(a, b, Concrete::gt),
            Sym::Lt(a, b) => bin(a, b, Concrete::lt),
            Sym::And(a, b) => match (a.get_value()?, b.get_value()?) {
                (Some(x), Some(y)) => Ok(Some(Concrete::Bool(x.as_bool()? && y.as_bool()?))),
                _ => Ok(None),
            },
            Sym::Or(a, b) => match (a.get_value()?, b.get_value()?) {
                (Some(x), Some(y)) => Ok(Some(Concrete::Bool(x.as_bool()? || y.as_bool()?))),
                _ => Ok(None),
            },
            Sym::Not(a) => match a.get_value()? {
                Some(x) => Ok(Some(Concrete::Bool(!x.as_bool()?))),
                None => Ok(None),
            },
        }
    }

    /// `Const v` if fully concretizable, else `self` unchanged.
    pub fn try_fold_constant(&self) -> CoreResult<Sym> {
        Ok(match self.get_value()? {
            Some(v) => Sym::Const(v),
            None => self.clone(),
        })
    }

    /// One step of algebraic rewriting, recursing into children first.
    pub fn try_reduce(&self) -> CoreResult<Sym> {
        Ok(match self {
            Sym::Add(a, b) => {
                let (a, b) = (a.try_reduce()?, b.try_reduce()?);
                match (&a, &b) {
                    (Sym::Const(Concrete::Int32(0)), _) => b,
                    (_, Sym::Const(Concrete::Int32(0))) => a,
                    (Sym::Const(x), Sym::Const(y)) => Sym::Const((*x).add(*y)?),
                    _ => Sym::add(a, b),
                }
            }
            Sym::Sub(a, b) => {
                let (a, b) = (a.try_reduce()?, b.try_reduce()?);
                match (&a, &b) {
                    (_, Sym::Const(Concrete::Int32(0))) => a,
                    (Sym::Const(x), Sym::Const(y)) => Sym::Const((*x).sub(*y)?),
                    _ if a == b => Sym::zero(),
                    _ => Sym::sub(a, b),
                }
            }
            Sym::Mul(a, b) => {
                let (a, b) = (a.try_reduce()?, b.try_reduce()?);
                match (&a, &b) {
                    (Sym::Const(x), Sym::Const(y)) => Sym::Const((*x).mul(*y)?),
                    _ => Sym::mul(a, b),
                }
            }
            Sym::Div(a, b) => Sym::div(a.try_reduce()?, b.try_reduce()?),
            Sym::Mod(a, b) => Sym::rem(a.try_reduce()?, b.try_reduce()?),
            Sym::Abs(a) => Sym::abs(a.try_reduce()?),
            Sym::Eq(a, b) => {
                let (a, b) = (a.try_reduce()?, b.try_reduce()?);
                if a == b {
                    Sym::bool(true)
                } else {
                    match (&a, &b) {
                        (Sym::Const(x), Sym::Const(y)) => Sym::Const((*x).eq_val(*y)?),
                        _ => Sym::eq(a, b),
                    }
                }
            }
            Sym::Gt(a, b) => {
                let (a, b) = (a.try_reduce()?, b.try_reduce()?);
                match (&a, &b) {
                    (Sym::Const(x), Sym::Const(y)) => Sym::Const((*x).gt(*y)?),
                    _ => Sym::gt(a, b),
                }
            }
            Sym::Lt(a, b) => {
                let (a, b) = (a.try_reduce()?, b.try_reduce()?);
                match (&a, &b) {
                    (Sym::Const(x), Sym::Const(y)) => Sym::Const((*x).lt(*y)?),
                    _ => Sym::lt(a, b),
                }
            }
            Sym::And(a, b) => {
                let (a, b) = (a.try_reduce()?, b.try_reduce()?);
                match (&a, &b) {
                    (Sym::Const(Concrete::Bool(true)), _) => b,
                    (_, Sym::Const(Concrete::Bool(true))) => a,
                    (Sym::Const(Concrete::Bool(false)), _) | (_, Sym::Const(Concrete::Bool(false))) => {
                        Sym::bool(false)
                    }
                    _ => Sym::and(a, b),
                }
            }
            Sym::Or(a, b) => {
                let (a, b) = (a.try_reduce()?, b.try_reduce()?);
                match (&a, &b) {
                    (Sym::Const(Concrete::Bool(false)), _) => b,
                    (_, Sym::Const(Concrete::Bool(false))) => a,
                    (Sym::Const(Concrete::Bool(true)), _) | (_, Sym::Const(Concrete::Bool(true))) => {
                        Sym::bool(true)
                    }
                    _ => Sym::or(a, b),
                }
            }
            Sym::Not(a) => {
                let a = a.try_reduce()?;
                match &a {
                    Sym::Const(Concrete::Bool(b)) => Sym::bool(!b),
                    Sym::Not(inner) => (**inner).clone(),
                    _ => Sym::not(a),
                }
            }
            Sym::Ite(c, t, e) => {
                let c = c.try_reduce()?;
                match &c {
                    Sym::Const(Concrete::Bool(true)) => t.try_reduce()?,
                    Sym::Const(Concrete::Bool(false)) => e.try_reduce()?,
                    _ => Sym::Ite(Rc::new(c), Rc::new(t.try_reduce()?), Rc::new(e.try_reduce()?)),
                }
            }
            Sym::Pointer(a) => Sym::Pointer(Rc::new(a.try_reduce()?)),
            Sym::Const(_) | Sym::Var(_) => self.clone(),
        })
    }

    /// Iterate `try_fold_constant . try_reduce` to a fixed point, capped at
    /// `max_steps` (a cost guard, not a correctness requirement).
    pub fn simplify(&self, max_steps: usize) -> CoreResult<Sym> {
        let mut current = self.clone();
        for _ in 0..max_steps {
            let next = current.try_reduce()?.try_fold_constant()?;
            if next == current {
                return Ok(next);
            }
            current = next;
        }
        Ok(current)
    }
}

pub const DEFAULT_SIMPLIFY_STEPS: usize = 1000;

pub fn conjoin(xs: impl IntoIterator<Item = Sym>) -> Sym {
    xs.into_iter().fold(Sym::bool(true), Sym::and)
}

pub fn disjoin(xs: impl IntoIterator<Item = Sym>) -> Sym {
    xs.into_iter().fold(Sym::bool(false), Sym::or)
}

/// Lower bound of the addressable data-memory range.
pub const ADDR_MIN: i32 = 0;
/// Upper bound of the addressable data-memory range (inclusive).
pub const ADDR_MAX: i32 = 1 << 16;

/// Concretize to a data-memory address, or hand the unresolved term
/// back for the engine to report (§4.A).
pub fn to_concrete_address(t: &Sym) -> CoreResult<Result<i32, Sym>> {
    let simplified = t.simplify(100)?;
    match &simplified {
        Sym::Const(Concrete::Int32(i)) if (ADDR_MIN..=ADDR_MAX).contains(i) => Ok(Ok(*i)),
        Sym::Const(Concrete::Int32(i)) => Ok(Err(Sym::int(*i))),
        Sym::Const(Concrete::Word16(_)) => {
            unimplemented!("word-valued addresses are not modelled")
        }
        Sym::Const(Concrete::Bool(_)) => Err(CoreError::TypeError(
            "boolean value used as an address".into(),
        )),
        _ => Ok(Err(simplified)),
    }
}

/// Concretize to an `Int8`-range immediate.
pub fn to_immediate(t: &Sym) -> CoreResult<Result<i8, Sym>> {
    let simplified = t.simplify(100)?;
    match &simplified {
        Sym::Const(Concrete::Int32(i)) if (i8::MIN as i32..=i8::MAX as i32).contains(i) => {
            Ok(Ok(*i as i8))
        }
        Sym::Const(Concrete::Bool(_)) => {
            Err(CoreError::TypeError("boolean value used as an immediate".into()))
        }
        _ => Ok(Err(simplified)),
    }
}

/// Concretize to a 16-bit instruction code.
pub fn to_instruction_code(t: &Sym) -> CoreResult<Result<u16, Sym>> {
    let simplified = t.simplify(100)?;
    match &simplified {
        Sym::Const(Concrete::Int32(i)) if (0..=u16::MAX as i32).contains(i) => Ok(Ok(*i as u16)),
        Sym::Const(Concrete::Bool(_)) => {
            Err(CoreError::TypeError("boolean value used as an instruction code".into()))
        }
        _ => Ok(Err(simplified)),
    }
}

impl fmt::Display for Sym {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sym::Const(c) => write!(f, "{c}"),
            Sym::Var(n) => write!(f, "{n}"),
            Sym::Pointer(a) => write!(f, "*{a}"),
            Sym::Ite(c, t, e) => write!(f, "(if {c} then {t} else {e})"),
            Sym::Add(a, b) => write!(f, "({a} + {b})"),
            Sym::Sub(a, b) => write!(f, "({a} - {b})"),
            Sym::Mul(a, b) => write!(f, "({a} * {b})"),
            Sym::Div(a, b) => write!(f, "({a} / {b})"),
            Sym::Mod(a, b) => write!(f, "({a} % {b})"),
            Sym::Abs(a) => write!(f, "|{a}|"),
            Sym::Eq(a, b) => write!(f, "({a} == {b})"),
            Sym::Gt(a, b) => write!(f, "({a} > {b})"),
            Sym::Lt(a, b) => write!(f, "({a} < {b})"),
            Sym::And(a, b) => write!(f, "({a} && {b})"),
            Sym::Or(a, b) => write!(f, "({a} || {b})"),
            Sym::Not(a) => write!(f, "!{a}"),
        }
    }
}
