//! Concrete machine values (§3 `Concrete`).
//!
//! A tagged union of the value shapes the ISA's registers and memory
//! cells can hold. Arithmetic is defined on like-typed integer
//! variants; mixing `Word16`/`Int32` coerces to `Int32`; arithmetic on
//! `Bool` is a type error (fatal — see [`crate::error::CoreError::TypeError`]).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Concrete {
    Int32(i32),
    Word16(u16),
    Bool(bool),
}

impl Concrete {
    pub const MAX: i32 = i32::MAX;
    pub const MIN: i32 = i32::MIN;

    pub fn as_i32(self) -> CoreResult<i32> {
        match self {
            Concrete::Int32(i) => Ok(i),
            Concrete::Word16(w) => Ok(w as i32),
            Concrete::Bool(_) => Err(CoreError::TypeError(
                "cannot coerce Bool to an integer".into(),
            )),
        }
    }

    /// Like `as_i32`, but `Bool` coerces to `0`/`1` instead of erroring —
    /// used only by the comparison operators below, so that a flag read
    /// as the unset-key floor (`Const 0`) compares equal to an explicit
    /// `Bool(false)`. Arithmetic on `Bool` stays a type error
    /// (`binary_int` rejects it directly, never going through here).
    fn as_i32_for_comparison(self) -> CoreResult<i32> {
        match self {
            Concrete::Bool(b) => Ok(b as i32),
            other => other.as_i32(),
        }
    }

    pub fn as_bool(self) -> CoreResult<bool> {
        match self {
            Concrete::Bool(b) => Ok(b),
            // A nonzero integer is accepted as a boolean-context truth value;
            // this mirrors the solver-side Int/Bool crossover at flag reads.
            Concrete::Int32(i) => Ok(i != 0),
            Concrete::Word16(w) => Ok(w != 0),
        }
    }

    fn binary_int(self, other: Concrete, f: impl FnOnce(i32, i32) -> i32) -> CoreResult<Concrete> {
        match (self, other) {
            (Concrete::Word16(a), Concrete::Word16(b)) => {
                Ok(Concrete::Word16(f(a as i32, b as i32) as u16))
            }
            (Concrete::Bool(_), _) | (_, Concrete::Bool(_)) => Err(CoreError::TypeError(
                "arithmetic on Bool is undefined".into(),
            )),
            (a, b) => Ok(Concrete::Int32(f(a.as_i32()?, b.as_i32()?))),
        }
    }

    pub fn add(self, other: Concrete) -> CoreResult<Concrete> {
        self.binary_int(other, |a, b| a.wrapping_add(b))
    }

    pub fn sub(self, other: Concrete) -> CoreResult<Concrete> {
        self.binary_int(other, |a, b| a.wrapping_sub(b))
    }

    pub fn mul(self, other: Concrete) -> CoreResult<Concrete> {
        self.binary_int(other, |a, b| a.wrapping_mul(b))
    }

    pub fn div(self, other: Concrete) -> CoreResult<Concrete> {
        let (a, b) = (self.as_i32()?, other.as_i32()?);
        if b == 0 {
            return Err(CoreError::ConcreteDivByZero);
        }
        Ok(Concrete::Int32(a.wrapping_div(b)))
    }

    pub fn rem(self, other: Concrete) -> CoreResult<Concrete> {
        let (a, b) = (self.as_i32()?, other.as_i32()?);
        if b == 0 {
            return Err(CoreError::ConcreteDivByZero);
        }
        Ok(Concrete::Int32(a.wrapping_rem(b)))
    }

    pub fn abs(self) -> CoreResult<Concrete> {
        match self {
            Concrete::Int32(i) => Ok(Concrete::Int32(i.wrapping_abs())),
            Concrete::Word16(w) => Ok(Concrete::Word16(w)),
            Concrete::Bool(_) => Err(CoreError::TypeError("abs of Bool is undefined".into())),
        }
    }

    pub fn eq_val(self, other: Concrete) -> CoreResult<Concrete> {
        Ok(Concrete::Bool(self.as_i32_for_comparison()? == other.as_i32_for_comparison()?))
    }

    pub fn gt(self, other: Concrete) -> CoreResult<Concrete> {
        Ok(Concrete::Bool(self.as_i32_for_comparison()? > other.as_i32_for_comparison()?))
    }

    pub fn lt(self, other: Concrete) -> CoreResult<Concrete> {
        Ok(Concrete::Bool(self.as_i32_for_comparison()? < other.as_i32_for_comparison()?))
    }
}

impl fmt::Display for Concrete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concrete::Int32(i) => write!(f, "{i}"),
            Concrete::Word16(w) => write!(f, "{w}u16"),
            Concrete::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<i32> for Concrete {
    fn from(v: i32) -> Self {
        Concrete::Int32(v)
    }
}

impl From<bool> for Concrete {
    fn from(v: bool) -> Self {
        Concrete::Bool(v)
    }
}
