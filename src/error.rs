//! Fatal and recoverable error kinds for the symbolic execution core.
//!
//! Fatal kinds are host-level failures: something the path-condition
//! pruning should have made unreachable, or a genuine modelling gap
//! (see the error table in the design notes). They carry enough of
//! the offending expression/context to debug without re-running.
//! Recoverable conditions (solver unknown/unsat) are not errors —
//! they're [`crate::smt::Solution`] variants attached to a `Context`.

use crate::sym::Sym;

#[derive(Clone, Debug, thiserror::Error)]
pub enum CoreError {
    #[error("instruction counter is symbolic and cannot be concretized: {0}")]
    SymbolicIc(Sym),

    #[error("no instruction decodes from code {0:#06x}")]
    UnknownOpcode(u16),

    #[error("LoadMI pointer is symbolic or out of the address range: {0}")]
    InvalidIndirectAddress(Sym),

    #[error("division by zero reached during concretization of {0}")]
    DivisionByZeroReached(Sym),

    #[error("type error: {0}")]
    TypeError(String),

    /// Internal: a concrete division/remainder hit a zero divisor. Never
    /// escapes `concrete.rs` — callers that concretize a `Sym` must catch
    /// this and rewrap it as [`CoreError::DivisionByZeroReached`] with the
    /// offending term attached.
    #[error("concrete division by zero")]
    ConcreteDivByZero,
}

pub type CoreResult<T> = Result<T, CoreError>;
