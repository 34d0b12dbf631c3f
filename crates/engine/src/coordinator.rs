// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-tick coordination: lock, record, run, record
//!
//! ```text
//! Idle -> LockRequested -> Skipped
//!                       -> Running -> Completed
//! ```
//!
//! A denied lock skips the tick silently. A granted lock opens a RUNNING
//! history entry before the body starts and closes it with the outcome.
//! Shutdown before the lock is granted cancels the tick without writing
//! anything; shutdown after a grant but before the body starts releases the
//! lease. Shutdown while the body runs aborts it, records FAILURE
//! "interrupted" and returns [`CoordinatorError::Interrupted`].

use crate::error::CoordinatorError;
use crate::lock_manager::{Acquisition, DenyReason, LockManager, ReleaseOutcome};
use crate::recorder::{HistoryHandle, HistoryRecorder};
use crate::shutdown::Shutdown;
use shed_core::{Clock, Completion, HistoryId, HolderId, Job, JobContext, Lease, TaskDef};
use shed_storage::{HistoryStore, LockStore};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Failure message written when shutdown interrupts a running body
pub const INTERRUPTED_REASON: &str = "interrupted";

/// Lifecycle of a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickState {
    Idle,
    LockRequested,
    Skipped,
    Running,
    Completed,
}

impl fmt::Display for TickState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TickState::Idle => "idle",
            TickState::LockRequested => "lock_requested",
            TickState::Skipped => "skipped",
            TickState::Running => "running",
            TickState::Completed => "completed",
        };
        write!(f, "{}", s)
    }
}

/// How a tick ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Lock denied; nothing ran and nothing was recorded
    Skipped(DenyReason),
    /// Shutdown arrived before the body started; nothing was recorded
    Cancelled,
    /// Body ran to completion
    Completed {
        history_id: Option<HistoryId>,
        completion: Completion,
    },
}

impl TickOutcome {
    pub fn state(&self) -> TickState {
        match self {
            TickOutcome::Skipped(_) | TickOutcome::Cancelled => TickState::Skipped,
            TickOutcome::Completed { .. } => TickState::Completed,
        }
    }
}

/// Runs ticks for one replica identity
pub struct Coordinator<L, H, C> {
    locks: LockManager<L, C>,
    recorder: HistoryRecorder<H, C>,
    holder: HolderId,
    clock: C,
}

impl<L, H, C> Coordinator<L, H, C>
where
    L: LockStore,
    H: HistoryStore,
    C: Clock,
{
    pub fn new(
        locks: LockManager<L, C>,
        recorder: HistoryRecorder<H, C>,
        holder: HolderId,
        clock: C,
    ) -> Self {
        Self {
            locks,
            recorder,
            holder,
            clock,
        }
    }

    pub fn holder(&self) -> &HolderId {
        &self.holder
    }

    pub fn locks(&self) -> &LockManager<L, C> {
        &self.locks
    }

    pub fn recorder(&self) -> &HistoryRecorder<H, C> {
        &self.recorder
    }

    /// Run one firing of `task`
    pub async fn run_tick(
        &self,
        task: &TaskDef,
        job: Arc<dyn Job>,
        shutdown: &Shutdown,
    ) -> Result<TickOutcome, CoordinatorError> {
        let mut state = TickState::Idle;
        if shutdown.is_triggered() {
            step(task, &mut state, TickState::Skipped);
            return Ok(TickOutcome::Cancelled);
        }
        step(task, &mut state, TickState::LockRequested);

        // An abandoned write on a blocking store may still land; that lease
        // lapses at max_hold
        let acquisition = tokio::select! {
            acquisition = self.locks.acquire(&task.lock_name, task.hold, &self.holder) => acquisition,
            () = shutdown.wait() => {
                tracing::info!(task = %task.name, "shutdown before lock granted; cancelling tick");
                step(task, &mut state, TickState::Skipped);
                return Ok(TickOutcome::Cancelled);
            }
        };
        let lease = match acquisition {
            Acquisition::Granted(lease) => lease,
            Acquisition::Denied(reason) => {
                step(task, &mut state, TickState::Skipped);
                return Ok(TickOutcome::Skipped(reason));
            }
        };
        if shutdown.is_triggered() {
            tracing::info!(task = %task.name, "shutdown after lock granted; releasing");
            self.release(&lease).await;
            step(task, &mut state, TickState::Skipped);
            return Ok(TickOutcome::Cancelled);
        }

        step(task, &mut state, TickState::Running);
        let handle = self.recorder.record_start(&task.name, &self.holder).await;
        if shutdown.is_triggered() {
            // The RUNNING entry is already written; close it before leaving
            tracing::warn!(task = %task.name, "shutdown before body started; recording interruption");
            if let Some(handle) = &handle {
                self.recorder.record_failure(handle, INTERRUPTED_REASON).await;
            }
            self.release(&lease).await;
            return Err(CoordinatorError::Interrupted {
                job: task.name.clone(),
            });
        }

        let ctx = JobContext {
            job_name: task.name.clone(),
            executor: self.holder.clone(),
            started_at: self.clock.now(),
            history_id: handle.as_ref().map(|h| h.id),
        };
        let mut body = tokio::spawn(async move { job.run(ctx).await });

        let joined = tokio::select! {
            joined = &mut body => joined,
            () = shutdown.wait() => {
                body.abort();
                tracing::warn!(task = %task.name, "shutdown while running; recording interruption");
                if let Some(handle) = &handle {
                    self.recorder.record_failure(handle, INTERRUPTED_REASON).await;
                }
                return Err(CoordinatorError::Interrupted {
                    job: task.name.clone(),
                });
            }
        };

        let completion = match joined {
            Ok(Ok(())) => Completion::Success,
            Ok(Err(e)) => Completion::failure(e.to_string()),
            Err(e) if e.is_panic() => Completion::failure(panic_message(e.into_panic())),
            Err(e) => Completion::failure(e.to_string()),
        };
        self.finish(task, handle.as_ref(), &completion).await;

        if task.release_early {
            self.release(&lease).await;
        }

        step(task, &mut state, TickState::Completed);
        Ok(TickOutcome::Completed {
            history_id: handle.map(|h| h.id),
            completion,
        })
    }

    async fn finish(&self, task: &TaskDef, handle: Option<&HistoryHandle>, completion: &Completion) {
        match completion {
            Completion::Success => tracing::info!(task = %task.name, "job succeeded"),
            Completion::Failure(message) => {
                tracing::warn!(task = %task.name, error = %message, "job failed")
            }
        }
        let Some(handle) = handle else {
            return;
        };
        match completion {
            Completion::Success => self.recorder.record_success(handle).await,
            Completion::Failure(message) => self.recorder.record_failure(handle, message).await,
        }
    }

    async fn release(&self, lease: &Lease) {
        match self.locks.release(lease).await {
            Ok(ReleaseOutcome::Released { until }) => {
                tracing::debug!(lock = %lease.name, %until, "released early")
            }
            Ok(ReleaseOutcome::NotHeld) => {
                tracing::debug!(lock = %lease.name, "lease already gone")
            }
            // Lease still expires at max_hold
            Err(e) => tracing::warn!(lock = %lease.name, error = %e, "release failed"),
        }
    }
}

fn step(task: &TaskDef, state: &mut TickState, next: TickState) {
    tracing::debug!(task = %task.name, from = %state, to = %next, "tick");
    *state = next;
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
