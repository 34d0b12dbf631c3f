// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage contracts shared by all replicas
//!
//! The lock store and the history store are independent: no operation spans
//! both, and every mutation is a single-row atomic write.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shed_core::{Completion, HistoryEntry, HistoryId, LockRecord, NewHistoryEntry};
use std::io;
use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage task failed: {0}")]
    Background(String),
}

/// Durable table of lock records keyed by lock name
#[async_trait]
pub trait LockStore: Send + Sync + 'static {
    async fn get(&self, name: &str) -> Result<Option<LockRecord>, StoreError>;

    /// Atomically store `next` only if the current record for `next.name`
    /// equals `expected` (`None` meaning no record exists).
    ///
    /// Returns false when another writer got there first.
    async fn compare_and_swap(
        &self,
        expected: Option<&LockRecord>,
        next: LockRecord,
    ) -> Result<bool, StoreError>;

    /// All records, ordered by lock name
    async fn list(&self) -> Result<Vec<LockRecord>, StoreError>;
}

/// Durable log of job executions keyed by generated id
#[async_trait]
pub trait HistoryStore: Send + Sync + 'static {
    /// Create a RUNNING entry and assign its id
    async fn insert(&self, new: NewHistoryEntry) -> Result<HistoryEntry, StoreError>;

    /// Finalize an entry. Returns false if it is missing or already terminal.
    async fn finish(
        &self,
        id: HistoryId,
        completion: Completion,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn get(&self, id: HistoryId) -> Result<Option<HistoryEntry>, StoreError>;

    /// All entries in insertion order
    async fn list(&self) -> Result<Vec<HistoryEntry>, StoreError>;

    /// The last `limit` entries in insertion order
    async fn list_recent(&self, limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        let mut entries = self.list().await?;
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        Ok(entries)
    }
}

/// Run blocking storage work off the async runtime
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| StoreError::Background(e.to_string()))?
}
