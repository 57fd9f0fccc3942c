//! `branchwright explore` — run to completion and solve every leaf's
//! path condition, reporting which ones are actually reachable.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use branchwright::config::EngineConfig;
use branchwright::smt::SolverDriver;

#[derive(Args)]
pub struct ExploreArgs {
    pub program: PathBuf,

    #[arg(long, default_value_t = EngineConfig::default().step_budget)]
    pub step_budget: u64,

    #[arg(long, default_value_t = EngineConfig::default().solver_timeout_ms)]
    pub solver_timeout_ms: u64,

    /// Write the explored state tree as Graphviz dot to this path.
    #[arg(long)]
    pub dot: Option<PathBuf>,
}

pub fn explore(args: ExploreArgs) -> super::CliResult<()> {
    let ctx = super::load_program(&args.program)?;
    let cfg = EngineConfig { step_budget: args.step_budget, ..EngineConfig::default() };
    let (mut trace, stats) = branchwright::engine::run(ctx, &cfg)?;
    info!(leaves = stats.leaves_produced, "exploration finished, solving leaves");

    if let Some(path) = &args.dot {
        std::fs::write(path, branchwright::tree::export::to_dot(&trace.tree))?;
    }

    let driver = SolverDriver::new(args.solver_timeout_ms);
    // Some tree leaves are branches the engine already pruned during
    // exploration (the solver found their path condition unsatisfiable
    // before they were stepped to completion), so they were never
    // recorded into `trace.contexts` — skip those rather than panic.
    let mut leaves: Vec<_> =
        trace.tree.leafs().into_iter().filter(|id| trace.contexts.contains_key(id)).collect();
    let mut contexts: Vec<_> = leaves
        .iter()
        .map(|id| trace.contexts.remove(id).expect("filtered to leaves with a context"))
        .collect();
    let results = driver.check_all(&mut contexts);
    for ((id, ctx), result) in leaves.drain(..).zip(contexts.into_iter()).zip(results) {
        result?;
        println!("leaf {id}: {:?}", ctx.solution);
        trace.contexts.insert(id, ctx);
    }
    Ok(())
}
