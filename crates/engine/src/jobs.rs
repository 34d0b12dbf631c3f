// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in job bodies

use async_trait::async_trait;
use shed_core::{Job, JobContext, JobError};
use std::time::Duration;
use tokio::process::Command;

/// Longest stderr tail carried into a failure message
const STDERR_TAIL: usize = 1024;

/// Runs a shell command; a non-zero exit fails the job
#[derive(Debug, Clone)]
pub struct CommandJob {
    command: String,
}

impl CommandJob {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl Job for CommandJob {
    async fn run(&self, ctx: JobContext) -> Result<(), JobError> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&self.command)
            .env("SHED_JOB_NAME", &ctx.job_name)
            .env("SHED_EXECUTOR", ctx.executor.as_str())
            // Aborting the tick drops this future; take the child down with it
            .kill_on_drop(true);
        if let Some(id) = ctx.history_id {
            cmd.env("SHED_HISTORY_ID", id.to_string());
        }

        let output = cmd.output().await.map_err(|source| JobError::Io {
            context: format!("spawn `{}`", self.command),
            source,
        })?;

        if !output.stdout.is_empty() {
            tracing::info!(
                job = %ctx.job_name,
                stdout = %String::from_utf8_lossy(&output.stdout).trim_end(),
                "command stdout"
            );
        }
        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = tail(stderr.trim(), STDERR_TAIL);
        let status = match output.status.code() {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        };
        if stderr.is_empty() {
            Err(JobError::Failed(status))
        } else {
            Err(JobError::Failed(format!("{}: {}", status, stderr)))
        }
    }
}

/// Simulated work that sleeps for a fixed duration
#[derive(Debug, Clone, Copy)]
pub struct SleepJob {
    duration: Duration,
}

impl SleepJob {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

#[async_trait]
impl Job for SleepJob {
    async fn run(&self, ctx: JobContext) -> Result<(), JobError> {
        tracing::debug!(job = %ctx.job_name, duration = ?self.duration, "sleeping");
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}

/// Last `max` bytes of `s`, cut on a char boundary
fn tail(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
