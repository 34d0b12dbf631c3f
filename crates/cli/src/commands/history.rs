// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `shed history`

use crate::output::{self, format_elapsed, format_time, OutputFormat};
use clap::Args;
use shed_core::{HistoryEntry, JobStatus};
use shed_daemon::protocol::select_history;
use shed_daemon::{Config, DaemonPaths};
use shed_storage::{FileHistoryStore, HistoryStore, StoreError};
use std::fmt;

#[derive(Args)]
pub struct HistoryArgs {
    /// Only show runs of this job
    #[arg(long)]
    job: Option<String>,

    /// Show the last N runs
    #[arg(long, short = 'n', default_value_t = 20)]
    limit: usize,
}

/// Text rendering of one history row
struct Row<'a>(&'a HistoryEntry);

impl fmt::Display for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = self.0;
        let elapsed = e
            .end_time
            .map(|end| format_elapsed(e.start_time, end))
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "{:>6}  {:<24} {:<8} {}  {:>7}  {}",
            e.id.0,
            e.job_name,
            e.status.to_string(),
            format_time(e.start_time),
            elapsed,
            e.executed_by
        )?;
        if let (JobStatus::Failure, Some(message)) = (e.status, &e.error_message) {
            let first_line = message.lines().next().unwrap_or_default();
            write!(f, "  {}", first_line)?;
        }
        Ok(())
    }
}

pub async fn handle(
    args: HistoryArgs,
    config: &Config,
    paths: &DaemonPaths,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let HistoryArgs { job, limit } = args;
    let job_for_store = job.clone();
    let entries = super::daemon_or_store(
        paths,
        |client| async move { client.history(job, Some(limit)).await },
        || read_store(config, job_for_store, limit),
    )
    .await?;

    match format {
        OutputFormat::Json => output::print_json(&entries),
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No history");
            }
            for entry in &entries {
                println!("{}", Row(entry));
            }
        }
    }
    Ok(())
}

async fn read_store(
    config: &Config,
    job: Option<String>,
    limit: usize,
) -> Result<Vec<HistoryEntry>, StoreError> {
    if !config.scheduler.store_dir.exists() {
        return Ok(Vec::new());
    }
    let entries = FileHistoryStore::open(&config.scheduler.store_dir)?
        .list()
        .await?;
    Ok(select_history(entries, job.as_deref(), Some(limit)))
}
