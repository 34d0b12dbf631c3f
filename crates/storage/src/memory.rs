// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process stores
//!
//! Clones share state, so several coordinators in one process can act as
//! replicas racing on the same store.

use crate::state::{HistoryOp, HistoryState};
use crate::store::{HistoryStore, LockStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shed_core::{Completion, HistoryEntry, HistoryId, LockRecord, NewHistoryEntry};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Lock table held in memory
#[derive(Clone, Default)]
pub struct MemoryLockStore {
    records: Arc<Mutex<BTreeMap<String, LockRecord>>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn get(&self, name: &str) -> Result<Option<LockRecord>, StoreError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(name).cloned())
    }

    async fn compare_and_swap(
        &self,
        expected: Option<&LockRecord>,
        next: LockRecord,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if records.get(&next.name) != expected {
            return Ok(false);
        }
        records.insert(next.name.clone(), next);
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<LockRecord>, StoreError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.values().cloned().collect())
    }
}

/// Job history held in memory
#[derive(Clone, Default)]
pub struct MemoryHistoryStore {
    state: Arc<Mutex<HistoryState>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn insert(&self, new: NewHistoryEntry) -> Result<HistoryEntry, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = state.started(&new.request_id) {
            return Ok(entry.clone());
        }
        let (entry, op) = state.start_op(new);
        state.apply(&op);
        Ok(entry)
    }

    async fn finish(
        &self,
        id: HistoryId,
        completion: Completion,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.apply(&HistoryOp::Finish { id, completion, at }))
    }

    async fn get(&self, id: HistoryId) -> Result<Option<HistoryEntry>, StoreError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.list())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
