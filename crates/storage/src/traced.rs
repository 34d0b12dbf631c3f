// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrappers for consistent observability

use crate::store::{HistoryStore, LockStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shed_core::{Completion, HistoryEntry, HistoryId, LockRecord, NewHistoryEntry};

/// Wrapper that adds tracing to any LockStore
#[derive(Clone)]
pub struct TracedLockStore<S> {
    inner: S,
}

impl<S> TracedLockStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: LockStore> LockStore for TracedLockStore<S> {
    async fn get(&self, name: &str) -> Result<Option<LockRecord>, StoreError> {
        let result = self.inner.get(name).await;
        tracing::trace!(name, found = ?result.as_ref().ok().map(Option::is_some), "lock read");
        result
    }

    async fn compare_and_swap(
        &self,
        expected: Option<&LockRecord>,
        next: LockRecord,
    ) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("lock.cas", name = %next.name, holder = %next.locked_by);
        let _guard = span.enter();

        let start = std::time::Instant::now();
        let until = next.locked_until;
        let result = self.inner.compare_and_swap(expected, next).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(true) => tracing::debug!(
                %until,
                elapsed_ms = elapsed.as_millis() as u64,
                "swapped"
            ),
            Ok(false) => tracing::debug!(
                elapsed_ms = elapsed.as_millis() as u64,
                "lost race"
            ),
            Err(e) => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "swap failed"
            ),
        }

        result
    }

    async fn list(&self) -> Result<Vec<LockRecord>, StoreError> {
        let result = self.inner.list().await;
        tracing::trace!(count = ?result.as_ref().map(Vec::len).ok(), "locks listed");
        result
    }
}

/// Wrapper that adds tracing to any HistoryStore
#[derive(Clone)]
pub struct TracedHistoryStore<S> {
    inner: S,
}

impl<S> TracedHistoryStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: HistoryStore> HistoryStore for TracedHistoryStore<S> {
    async fn insert(&self, new: NewHistoryEntry) -> Result<HistoryEntry, StoreError> {
        let span = tracing::debug_span!("history.insert", job = %new.job_name);
        let _guard = span.enter();

        let start = std::time::Instant::now();
        let result = self.inner.insert(new).await;
        let elapsed = start.elapsed();

        match &result {
            Ok(entry) => tracing::debug!(
                id = %entry.id,
                elapsed_ms = elapsed.as_millis() as u64,
                "history entry opened"
            ),
            Err(e) => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "insert failed"
            ),
        }

        result
    }

    async fn finish(
        &self,
        id: HistoryId,
        completion: Completion,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("history.finish", %id, status = %completion.status());
        let _guard = span.enter();

        let result = self.inner.finish(id, completion, at).await;
        match &result {
            Ok(true) => tracing::debug!("history entry closed"),
            // Already terminal is expected when a retry raced the first write
            Ok(false) => tracing::debug!("history entry already final"),
            Err(e) => tracing::warn!(error = %e, "finish failed"),
        }

        result
    }

    async fn get(&self, id: HistoryId) -> Result<Option<HistoryEntry>, StoreError> {
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let result = self.inner.list().await;
        tracing::trace!(count = ?result.as_ref().map(Vec::len).ok(), "history listed");
        result
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        self.inner.list_recent(limit).await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
