//! Effect interface (§4.C).
//!
//! The distilled design speaks of a capability hierarchy — Functor,
//! Applicative, Selective, Monad — graded by how much of an
//! instruction's control flow an execution backend can express. In a
//! systems language those capability classes collapse: there is one
//! backend (`Context` is always `Sym`-valued, concrete execution is
//! just the case where every binding happens to simplify to a
//! `Const`), so `Effect` only needs to name the two primitives every
//! opcode uses. `selectiveIf` — branching on a guard that may or may
//! not concretize — is not a capability some backends lack; it is
//! handled once, at the engine level, for the three branching opcodes
//! (`Jump`, `JumpCt`, `JumpCf`), via [`decide`].

use crate::error::CoreResult;
use crate::isa::context::Context;
use crate::key::Key;
use crate::sym::Sym;

pub trait Effect {
    fn read(&self, key: Key) -> Sym;
    fn write(&mut self, key: Key, value: Sym);
}

impl Effect for Context {
    fn read(&self, key: Key) -> Sym {
        Context::read(self, key)
    }

    fn write(&mut self, key: Key, value: Sym) {
        Context::write(self, key, value)
    }
}

/// Resolution of a branch guard: either both carriers agree on one
/// outcome, or the guard doesn't concretize and the engine must fork.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Concrete(bool),
    Fork,
}

/// `selectiveIf`, collapsed to a single free function: a guard decides
/// concretely when it is fully concretizable, and forks otherwise
/// (Open Question 3 — a guard that is merely *unresolved*, not
/// concretely true/false, forks both ways rather than being treated as
/// "unknown" and dropped).
pub fn decide(guard: &Sym) -> CoreResult<Decision> {
    Ok(match guard.get_value()? {
        Some(c) => Decision::Concrete(c.as_bool()?),
        None => Decision::Fork,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concrete_guard_decides_without_forking() {
        assert_eq!(decide(&Sym::bool(true)).unwrap(), Decision::Concrete(true));
        assert_eq!(decide(&Sym::bool(false)).unwrap(), Decision::Concrete(false));
    }

    #[test]
    fn symbolic_guard_forks() {
        assert_eq!(decide(&Sym::var("cond")).unwrap(), Decision::Fork);
    }

    #[test]
    fn effect_trait_round_trips_through_context() {
        let mut ctx = Context::new();
        Effect::write(&mut ctx, Key::Ic, Sym::int(3));
        assert_eq!(Effect::read(&ctx, Key::Ic), Sym::int(3));
    }
}
