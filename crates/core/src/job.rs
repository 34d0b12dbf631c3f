// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pluggable unit of scheduled work

use crate::id::{HistoryId, HolderId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Why a job body failed; the display text becomes the history error message
#[derive(Debug, Error)]
pub enum JobError {
    #[error("{0}")]
    Failed(String),
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl JobError {
    pub fn failed(message: impl Into<String>) -> Self {
        JobError::Failed(message.into())
    }
}

/// What a job knows about the tick it is running for
#[derive(Debug, Clone)]
pub struct JobContext {
    pub job_name: String,
    pub executor: HolderId,
    pub started_at: DateTime<Utc>,
    /// Absent when the RUNNING entry could not be written
    pub history_id: Option<HistoryId>,
}

/// A job body run at most once per tick across the cluster.
///
/// New scheduled jobs are added by implementing this trait; the
/// coordinator never needs to change.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    async fn run(&self, ctx: JobContext) -> Result<(), JobError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_displays_message_verbatim() {
        assert_eq!(JobError::failed("disk full").to_string(), "disk full");
    }

    #[test]
    fn io_error_includes_context() {
        let err = JobError::Io {
            context: "spawn command".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.to_string(), "spawn command: no such file");
    }
}
