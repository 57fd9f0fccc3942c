//! Symbolic execution core for a small 32-bit instruction set: a
//! symbolic expression algebra, a mixed concrete/symbolic machine
//! state store, instruction semantics, a forking execution engine, an
//! SMT-backed solver driver, and an ACTL property checker.

pub mod actl;
pub mod concrete;
pub mod config;
pub mod engine;
pub mod error;
pub mod isa;
pub mod key;
pub mod smt;
pub mod sym;
pub mod tree;

pub use config::EngineConfig;
pub use error::{CoreError, CoreResult};
pub use isa::{Context, Instruction, Solution};
