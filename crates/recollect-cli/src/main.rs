//! Recollect CLI entry point.
//!
//! Binary name: `rcl`
//!
//! Parses CLI arguments, sets up tracing, loads configuration, then
//! dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use recollect_observe::{TracingOptions, init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let tracing_options = TracingOptions::from_verbosity(cli.verbose, cli.quiet);
    if let Err(e) = init_tracing(&tracing_options) {
        eprintln!("Warning: failed to initialize logging: {e}");
    }

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "rcl", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;
    let json = cli.json;

    match cli.command {
        Commands::Remember {
            owner,
            texts,
            memory_type,
        } => {
            cli::memory::remember(&state, &owner, &texts, memory_type.as_deref(), json).await?;
        }

        Commands::Recall {
            owner,
            query,
            top_k,
        } => {
            cli::memory::recall(&state, &owner, &query, top_k, json).await?;
        }

        Commands::Count { owner } => {
            cli::memory::count(&state, &owner, json).await?;
        }

        Commands::Config => {
            cli::config::show_config(&state, json)?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
