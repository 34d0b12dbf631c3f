// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! shed scheduling engine
//!
//! Locks, history recording, per-tick coordination and the scheduler
//! service that drives registered tasks.

mod coordinator;
mod error;
mod jobs;
mod lock_manager;
mod recorder;
mod scheduler;
mod service;
pub mod shutdown;

pub use coordinator::{Coordinator, TickOutcome, TickState, INTERRUPTED_REASON};
pub use error::{CoordinatorError, ServiceError};
pub use jobs::{CommandJob, SleepJob};
pub use lock_manager::{
    Acquisition, DenyReason, LockManager, ReleaseOutcome, DEFAULT_ACQUIRE_TIMEOUT,
};
pub use recorder::{HistoryHandle, HistoryRecorder, DEFAULT_WRITE_TIMEOUT};
pub use scheduler::{ScheduledItem, Scheduler};
pub use service::{RunningScheduler, SchedulerService, TaskStatus, DEFAULT_POLL_INTERVAL};
pub use shutdown::{Shutdown, ShutdownTrigger};
