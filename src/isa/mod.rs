//! The machine: state store, effect interface, and instruction set
//! (§3, §4.B–§4.D).

pub mod context;
pub mod effect;
pub mod encoding;
pub mod semantics;

pub use context::{Context, Solution};
pub use effect::{decide, Decision, Effect};
pub use encoding::{decode, encode, Instruction, InstructionCode};
pub use semantics::{execute, Control};
