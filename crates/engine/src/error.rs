// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the scheduling engine

use thiserror::Error;

/// Errors returned from a single coordinated tick
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    /// Shutdown arrived after the RUNNING entry was opened
    #[error("job '{job}' interrupted by shutdown")]
    Interrupted { job: String },
}

/// Errors from the scheduler service
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("task already registered: {0}")]
    DuplicateTask(String),
    #[error("scheduler driver failed: {0}")]
    Driver(String),
}
