mod cli;

use clap::{Parser, Subcommand};

use cli::explore::ExploreArgs;
use cli::run::RunArgs;
use cli::verify::VerifyArgs;

#[derive(Parser)]
#[command(
    name = "branchwright",
    version,
    about = "Symbolic execution core for a small 32-bit ISA"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a program to completion, printing the final state of each leaf.
    Run(RunArgs),
    /// Run to completion, then solve each leaf's path condition.
    Explore(ExploreArgs),
    /// Run to completion, then check an ACTL formula against the trace.
    Verify(VerifyArgs),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => cli::run::run(args)?,
        Command::Explore(args) => cli::explore::explore(args)?,
        Command::Verify(args) => cli::verify::verify(args)?,
    }
    Ok(())
}
