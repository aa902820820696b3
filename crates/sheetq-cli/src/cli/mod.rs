//! CLI for the sheetq request queue.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sheetq_core::config;

use commands::{run_config, run_simulate, SimulateArgs};

/// Top-level CLI for sheetq.
#[derive(Debug, Parser)]
#[command(name = "sheetq")]
#[command(about = "sheetq: throttled, retrying request queue for spreadsheet APIs", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the effective configuration as TOML.
    Config,

    /// Drive the queue against a synthetic flaky remote and report each outcome.
    Simulate(SimulateArgs),
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Config => run_config(&cfg)?,
            CliCommand::Simulate(args) => run_simulate(&cfg, &args).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
