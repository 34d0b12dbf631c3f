// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! shed-core: Core types for the shed cluster scheduler
//!
//! This crate provides:
//! - Clock abstraction over wall-clock UTC time
//! - Lock records and the pure lease transition function
//! - Job history entries
//! - Triggers and task definitions
//! - The `Job` trait implemented by every scheduled body

pub mod clock;
pub mod id;

pub mod history;
pub mod job;
pub mod lock;
pub mod task;
pub mod trigger;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use history::{Completion, HistoryEntry, JobStatus, NewHistoryEntry, MAX_ERROR_MESSAGE_LEN};
pub use id::{HistoryId, HolderId};
pub use job::{Job, JobContext, JobError};
pub use lock::{HoldPolicy, Lease, LockInput, LockRecord, LockRejection, PolicyError};
pub use task::TaskDef;
pub use trigger::{Trigger, TriggerError};
