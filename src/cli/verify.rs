//! `branchwright verify` — run to completion, then check an ACTL
//! formula read from a JSON file against the resulting trace.

use std::path::PathBuf;

use clap::Args;

use branchwright::actl::{check, Formula, Proof};
use branchwright::config::EngineConfig;
use branchwright::smt::SolverDriver;

#[derive(Args)]
pub struct VerifyArgs {
    pub program: PathBuf,
    pub formula: PathBuf,

    #[arg(long, default_value_t = EngineConfig::default().step_budget)]
    pub step_budget: u64,

    #[arg(long, default_value_t = EngineConfig::default().solver_timeout_ms)]
    pub solver_timeout_ms: u64,
}

pub fn verify(args: VerifyArgs) -> super::CliResult<()> {
    let ctx = super::load_program(&args.program)?;
    let formula_text = std::fs::read_to_string(&args.formula)?;
    let formula: Formula = serde_json::from_str(&formula_text)?;

    let cfg = EngineConfig { step_budget: args.step_budget, ..EngineConfig::default() };
    let (trace, _stats) = branchwright::engine::run(ctx, &cfg)?;

    let driver = SolverDriver::new(args.solver_timeout_ms);
    match check(&formula, &trace, &driver)? {
        Proof::Proved => println!("proved"),
        Proof::Falsifiable { node, counterexample } => {
            println!("falsifiable at {node}:");
            for (name, value) in counterexample {
                println!("  {name} = {value}");
            }
            std::process::exit(1);
        }
    }
    Ok(())
}
