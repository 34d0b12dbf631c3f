// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job history entries
//!
//! One entry per execution: created RUNNING before the job body starts and
//! finalized exactly once with SUCCESS or FAILURE.

use crate::id::{HistoryId, HolderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on stored error messages, in characters
pub const MAX_ERROR_MESSAGE_LEN: usize = 4000;

/// Status of a job execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Running,
    Success,
    Failure,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Success => write!(f, "SUCCESS"),
            JobStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RUNNING" => Ok(JobStatus::Running),
            "SUCCESS" => Ok(JobStatus::Success),
            "FAILURE" => Ok(JobStatus::Failure),
            _ => Err(format!("unknown job status: {}", s)),
        }
    }
}

/// How an execution ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Completion {
    Success,
    Failure(String),
}

impl Completion {
    /// Failure with the message clipped to `MAX_ERROR_MESSAGE_LEN`
    pub fn failure(message: impl Into<String>) -> Self {
        Completion::Failure(truncate_message(message.into()))
    }

    pub fn status(&self) -> JobStatus {
        match self {
            Completion::Success => JobStatus::Success,
            Completion::Failure(_) => JobStatus::Failure,
        }
    }
}

/// Data needed to create a RUNNING entry; the store assigns the id.
///
/// `request_id` makes the insert idempotent: a store that already holds an
/// entry for the same request returns it instead of adding another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHistoryEntry {
    pub request_id: String,
    pub job_name: String,
    pub start_time: DateTime<Utc>,
    pub executed_by: HolderId,
}

impl NewHistoryEntry {
    /// New request with a fresh random request id
    pub fn new(job_name: impl Into<String>, start_time: DateTime<Utc>, executed_by: HolderId) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            job_name: job_name.into(),
            start_time,
            executed_by,
        }
    }
}

/// A recorded job execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub job_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub executed_by: HolderId,
    pub error_message: Option<String>,
}

impl HistoryEntry {
    pub fn running(id: HistoryId, new: NewHistoryEntry) -> Self {
        Self {
            id,
            job_name: new.job_name,
            start_time: new.start_time,
            end_time: None,
            status: JobStatus::Running,
            executed_by: new.executed_by,
            error_message: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Set the terminal status and end time together.
    ///
    /// Returns false and leaves the entry untouched if it is already terminal.
    pub fn finish(&mut self, completion: Completion, at: DateTime<Utc>) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.status = completion.status();
        self.end_time = Some(at);
        self.error_message = match completion {
            Completion::Success => None,
            Completion::Failure(message) => Some(truncate_message(message)),
        };
        true
    }
}

/// Clip a message to `MAX_ERROR_MESSAGE_LEN` characters, marking the cut with `…`
pub fn truncate_message(message: String) -> String {
    if message.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return message;
    }
    let mut clipped: String = message.chars().take(MAX_ERROR_MESSAGE_LEN - 1).collect();
    clipped.push('…');
    clipped
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
