//! Callguard binary entry point

use std::process::ExitCode;

use clap::Parser;

use callguard::cli::{run_classify, run_simulation, Cli, Commands, SimulateOverrides};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            scenario,
            json,
            settle_ms,
            backoff_ms,
            max_checks,
        } => {
            let overrides = SimulateOverrides {
                settle_ms,
                backoff_ms,
                max_checks,
            };
            run_simulation(&scenario, json, overrides).await
        }
        Commands::Classify { port_type, name } => run_classify(&port_type, &name),
    }
}
