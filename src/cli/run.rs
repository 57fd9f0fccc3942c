//! `branchwright run` — execute a program to completion and print the
//! state at every leaf the engine produced.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use branchwright::config::EngineConfig;

#[derive(Args)]
pub struct RunArgs {
    /// Path to a program JSON file (see `ProgramFile`).
    pub program: PathBuf,

    #[arg(long, default_value_t = EngineConfig::default().step_budget)]
    pub step_budget: u64,
}

pub fn run(args: RunArgs) -> super::CliResult<()> {
    let ctx = super::load_program(&args.program)?;
    let cfg = EngineConfig { step_budget: args.step_budget, ..EngineConfig::default() };
    let (trace, stats) = branchwright::engine::run(ctx, &cfg)?;

    info!(steps = stats.steps_taken, leaves = stats.leaves_produced, elapsed = ?stats.elapsed, "run complete");
    for (id, ctx) in trace.leaf_contexts() {
        println!("-- leaf {id} (halted: {}) --", ctx.is_halted());
        for (addr, value) in ctx.dump_memory() {
            println!("  @{addr} = {value}");
        }
    }
    Ok(())
}
