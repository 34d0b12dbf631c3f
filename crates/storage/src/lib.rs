// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Durable lock and history stores for shed
//!
//! Replicas coordinate only through these stores. The file-backed stores
//! share a directory between processes; the memory stores share state
//! between clones inside one process.

mod memory;
mod state;
mod store;
mod table;
mod traced;
mod wal;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use memory::{MemoryHistoryStore, MemoryLockStore};
pub use state::{HistoryOp, HistoryState};
pub use store::{HistoryStore, LockStore, StoreError};
pub use table::{FileLockStore, LOCK_TABLE_FILE};
pub use traced::{TracedHistoryStore, TracedLockStore};
pub use wal::{FileHistoryStore, HISTORY_LOG_FILE};

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FaultyHistoryStore, FaultyLockStore, Faults, StoreCall};
