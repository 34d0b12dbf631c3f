// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fault-injecting store wrappers for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::store::{HistoryStore, LockStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shed_core::{Completion, HistoryEntry, HistoryId, LockRecord, NewHistoryEntry};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    GetLock(String),
    CompareAndSwap(String),
    ListLocks,
    Insert(String),
    Finish(HistoryId),
    GetHistory(HistoryId),
    ListHistory,
}

#[derive(Default)]
struct FaultState {
    unreachable: bool,
    fail_next: u32,
    delay: Option<Duration>,
    calls: Vec<StoreCall>,
}

/// Shared fault switchboard; clones control the same wrappers
#[derive(Clone, Default)]
pub struct Faults {
    state: Arc<Mutex<FaultState>>,
}

impl Faults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every call until cleared
    pub fn set_unreachable(&self, unreachable: bool) {
        self.lock().unreachable = unreachable;
    }

    /// Fail the next `n` calls, then recover
    pub fn fail_next(&self, n: u32) {
        self.lock().fail_next = n;
    }

    /// Stall every call before it reaches the inner store
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.lock().delay = delay;
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FaultState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn check(&self, call: StoreCall) -> Result<(), StoreError> {
        let (delay, fail) = {
            let mut state = self.lock();
            state.calls.push(call);
            let fail = if state.unreachable {
                true
            } else if state.fail_next > 0 {
                state.fail_next -= 1;
                true
            } else {
                false
            };
            (state.delay, fail)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(StoreError::Unavailable("injected fault".to_string()));
        }
        Ok(())
    }
}

/// Lock store wrapper that fails on demand
#[derive(Clone)]
pub struct FaultyLockStore<S> {
    inner: S,
    faults: Faults,
}

impl<S> FaultyLockStore<S> {
    pub fn new(inner: S, faults: Faults) -> Self {
        Self { inner, faults }
    }
}

#[async_trait]
impl<S: LockStore> LockStore for FaultyLockStore<S> {
    async fn get(&self, name: &str) -> Result<Option<LockRecord>, StoreError> {
        self.faults.check(StoreCall::GetLock(name.to_string())).await?;
        self.inner.get(name).await
    }

    async fn compare_and_swap(
        &self,
        expected: Option<&LockRecord>,
        next: LockRecord,
    ) -> Result<bool, StoreError> {
        self.faults
            .check(StoreCall::CompareAndSwap(next.name.clone()))
            .await?;
        self.inner.compare_and_swap(expected, next).await
    }

    async fn list(&self) -> Result<Vec<LockRecord>, StoreError> {
        self.faults.check(StoreCall::ListLocks).await?;
        self.inner.list().await
    }
}

/// History store wrapper that fails on demand
#[derive(Clone)]
pub struct FaultyHistoryStore<S> {
    inner: S,
    faults: Faults,
}

impl<S> FaultyHistoryStore<S> {
    pub fn new(inner: S, faults: Faults) -> Self {
        Self { inner, faults }
    }
}

#[async_trait]
impl<S: HistoryStore> HistoryStore for FaultyHistoryStore<S> {
    async fn insert(&self, new: NewHistoryEntry) -> Result<HistoryEntry, StoreError> {
        self.faults
            .check(StoreCall::Insert(new.job_name.clone()))
            .await?;
        self.inner.insert(new).await
    }

    async fn finish(
        &self,
        id: HistoryId,
        completion: Completion,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.faults.check(StoreCall::Finish(id)).await?;
        self.inner.finish(id, completion, at).await
    }

    async fn get(&self, id: HistoryId) -> Result<Option<HistoryEntry>, StoreError> {
        self.faults.check(StoreCall::GetHistory(id)).await?;
        self.inner.get(id).await
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        self.faults.check(StoreCall::ListHistory).await?;
        self.inner.list().await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
