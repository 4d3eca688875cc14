//! Command-line entry point for the Soul Kiln alignment engine.
//!
//! Structured logging initialized first, configuration loaded next, then
//! dispatch into the command that was actually requested, with the
//! process exit code carrying the failure classification back to the
//! shell.

mod cli;
mod commands;
mod error;
mod parse;
mod seed;
mod session;
mod store_sync;

use clap::Parser;
use kiln_engine::SimulationConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    if let Err(err) = run().await {
        tracing::error!(error = %err, "command failed");
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };
    let store_url = cli.store_url.as_deref();

    match cli.command {
        Command::Init { seed, force } => commands::init(&cli.session, seed.as_deref(), force, config, store_url).await,
        Command::Reset { confirm } => commands::reset(&cli.session, confirm),
        Command::Status => commands::status(&cli.session, config),
        Command::Health => commands::health(&cli.session, config),
        Command::Spawn { archetype, parent_id, binding } => commands::spawn(&cli.session, archetype, parent_id.as_deref(), binding.as_deref(), config, store_url).await,
        Command::Test { agent_id, n_stimuli } => commands::test(&cli.session, &agent_id, n_stimuli, config),
        Command::Spread { node_id, agent_id } => commands::spread(&cli.session, &node_id, &agent_id, config),
        Command::Kiln => commands::kiln(&cli.session, config, store_url).await,
        Command::Dissolve { agent_id, reason } => commands::dissolve(&cli.session, &agent_id, &reason, config),
        Command::Warnings { agent_id } => commands::warnings(&cli.session, &agent_id, config),
    }
}
