//! `gitprovider` command-line entry point.
//!
//! The composition root:
//!
//! 1. **Parse configuration**: flags and `GIT_*` environment variables
//!    ([`config`]).
//! 2. **Wire observability**: JSON `tracing` output plus an optional OTLP
//!    exporter ([`observability`]).
//! 3. **Construct the backend**: the driver named by `--kind`, bound to a
//!    neutral client ([`backend`]).
//! 4. **Run one subcommand** and print its result as JSON on stdout.

mod backend;
mod commands;
mod config;
mod observability;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use crate::backend::Backend;
use crate::config::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let telemetry = observability::init()?;

    let result = run(&cli).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "command failed");
    }
    telemetry.shutdown();

    let output = result?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(cli: &Cli) -> Result<serde_json::Value> {
    let backend = Backend::connect(&cli.connection)?;
    backend
        .run(&cli.command, cli.connection.organization.as_deref())
        .await
}
