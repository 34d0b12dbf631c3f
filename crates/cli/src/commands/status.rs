// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `shed status`

use crate::client::{ClientError, DaemonClient};
use crate::output::{self, format_time, OutputFormat};
use serde::Serialize;
use shed_daemon::{DaemonPaths, TaskSummary};
use std::fmt;

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum StatusReport {
    NotRunning,
    Running {
        replica_id: String,
        version: String,
        uptime_secs: u64,
        tasks: Vec<TaskSummary>,
    },
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusReport::NotRunning => write!(f, "Daemon not running"),
            StatusReport::Running {
                replica_id,
                version,
                uptime_secs,
                tasks,
            } => {
                writeln!(f, "Daemon running (replica {}, v{})", replica_id, version)?;
                write!(f, "  Uptime: {}s", uptime_secs)?;
                for task in tasks {
                    write!(f, "\n  {}", TaskLine(task))?;
                }
                Ok(())
            }
        }
    }
}

pub struct TaskLine<'a>(pub &'a TaskSummary);

impl fmt::Display for TaskLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.0;
        let next = t
            .next_fire
            .map(format_time)
            .unwrap_or_else(|| "never".to_string());
        write!(f, "{:<24} {:<24} next {}", t.name, t.trigger, next)?;
        if t.lock_name != t.name {
            write!(f, "  lock={}", t.lock_name)?;
        }
        if t.running {
            write!(f, "  (running)")?;
        }
        Ok(())
    }
}

pub async fn handle(paths: &DaemonPaths, format: OutputFormat) -> anyhow::Result<()> {
    let status = match DaemonClient::connect(paths) {
        Ok(client) => client.status().await,
        Err(e) => Err(e),
    };
    let report = match status {
        Ok(s) => StatusReport::Running {
            replica_id: s.replica_id,
            version: s.version,
            uptime_secs: s.uptime_secs,
            tasks: s.tasks,
        },
        Err(ClientError::DaemonNotRunning) => StatusReport::NotRunning,
        Err(e) => return Err(e.into()),
    };
    output::print(&report, format);
    Ok(())
}
