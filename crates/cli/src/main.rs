// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! shed - cluster scheduler CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{check, history, locks, status, stop};
use shed_daemon::{Config, DaemonPaths};
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "shed", version, about = "shed - cluster-aware job scheduler")]
struct Cli {
    /// Config file (default: $SHED_CONFIG, then ./shed.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the daemon and its tasks
    Status,
    /// List lock records in the shared store
    Locks,
    /// Show recent job runs
    History(history::HistoryArgs),
    /// Stop the daemon, interrupting running jobs
    Stop,
    /// Validate the config and show when each task fires next
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&Config::resolve_path(cli.config))?;

    if let Commands::Check = cli.command {
        return check::handle(&config, cli.format);
    }

    let paths = DaemonPaths::for_config(&config.path)?;
    match cli.command {
        Commands::Status => status::handle(&paths, cli.format).await,
        Commands::Locks => locks::handle(&config, &paths, cli.format).await,
        Commands::History(args) => history::handle(args, &config, &paths, cli.format).await,
        Commands::Stop => stop::handle(&paths).await,
        Commands::Check => check::handle(&config, cli.format),
    }
}
