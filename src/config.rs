//! Engine configuration (§6).

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Steps a single leaf may take before it's forced to stop without
    /// having halted — a guard against non-terminating programs, not
    /// a correctness requirement.
    pub step_budget: u64,
    /// Wall-clock budget handed to each SMT query; an exhausted query
    /// resolves to `Solution::Unknown` rather than blocking forever.
    pub solver_timeout_ms: u64,
    /// Cap passed to `Sym::simplify` after every write.
    pub simplify_steps: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_budget: 10_000,
            solver_timeout_ms: 5_000,
            simplify_steps: crate::sym::DEFAULT_SIMPLIFY_STEPS,
        }
    }
}
