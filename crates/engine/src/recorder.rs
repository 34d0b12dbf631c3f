// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort job history recording
//!
//! Every call is one durable write. A failed or slow write is retried once
//! and then dropped with a warning; history never blocks or fails a job.
//! A timed-out write may still land after the retry starts, so every
//! attempt of one start carries the same request id and the store keeps a
//! single RUNNING entry for it.

use shed_core::{Clock, Completion, HistoryId, HolderId, NewHistoryEntry};
use shed_storage::{HistoryStore, StoreError};
use std::future::Future;
use std::time::Duration;

/// Bound on each history write attempt
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

const RETRY_DELAY: Duration = Duration::from_millis(200);
const ATTEMPTS: u32 = 2;

/// Reference to a RUNNING entry created by [`HistoryRecorder::record_start`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryHandle {
    pub id: HistoryId,
    pub job_name: String,
}

/// Writes RUNNING/SUCCESS/FAILURE entries for job executions
#[derive(Clone)]
pub struct HistoryRecorder<H, C> {
    store: H,
    clock: C,
    write_timeout: Duration,
    retry_delay: Duration,
}

impl<H: HistoryStore, C: Clock> HistoryRecorder<H, C> {
    pub fn new(store: H, clock: C) -> Self {
        Self {
            store,
            clock,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            retry_delay: RETRY_DELAY,
        }
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn store(&self) -> &H {
        &self.store
    }

    /// Create a RUNNING entry. `None` if the write was lost.
    pub async fn record_start(&self, job_name: &str, executor: &HolderId) -> Option<HistoryHandle> {
        let new = NewHistoryEntry::new(job_name, self.clock.now(), executor.clone());
        let entry = self
            .attempt("start", job_name, || self.store.insert(new.clone()))
            .await?;
        Some(HistoryHandle {
            id: entry.id,
            job_name: entry.job_name,
        })
    }

    pub async fn record_success(&self, handle: &HistoryHandle) {
        self.finish(handle, Completion::Success).await;
    }

    /// Mark the entry failed; long messages are clipped
    pub async fn record_failure(&self, handle: &HistoryHandle, message: &str) {
        self.finish(handle, Completion::failure(message)).await;
    }

    async fn finish(&self, handle: &HistoryHandle, completion: Completion) {
        let at = self.clock.now();
        let written = self
            .attempt("finish", &handle.job_name, || {
                self.store.finish(handle.id, completion.clone(), at)
            })
            .await;
        if written == Some(false) {
            tracing::debug!(id = %handle.id, job = %handle.job_name, "history entry missing or already final");
        }
    }

    async fn attempt<T, F, Fut>(&self, op: &'static str, job: &str, mut write: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        for attempt in 1..=ATTEMPTS {
            match tokio::time::timeout(self.write_timeout, write()).await {
                Ok(Ok(value)) => return Some(value),
                Ok(Err(e)) => tracing::warn!(op, job, attempt, error = %e, "history write failed"),
                Err(_) => tracing::warn!(
                    op,
                    job,
                    attempt,
                    timeout_ms = self.write_timeout.as_millis() as u64,
                    "history write timed out"
                ),
            }
            if attempt < ATTEMPTS {
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        tracing::warn!(op, job, "history write dropped");
        None
    }
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod tests;
