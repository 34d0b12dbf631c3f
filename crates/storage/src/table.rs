// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed lock table shared by replicas
//!
//! The table is one JSON document. Every access takes an advisory `fs2`
//! lock on a sidecar guard file (shared for reads, exclusive for writes)
//! and re-reads the document, so a compare-and-swap is atomic across all
//! processes that can see the directory. Writes go to a temp file that is
//! fsynced and renamed over the table.

use crate::store::{blocking, LockStore, StoreError};
use async_trait::async_trait;
use fs2::FileExt;
use shed_core::LockRecord;
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of the lock table inside a store directory
pub const LOCK_TABLE_FILE: &str = "locks.json";

type Records = BTreeMap<String, LockRecord>;

/// Lock store persisted as a JSON table
#[derive(Clone)]
pub struct FileLockStore {
    table: Arc<LockTable>,
}

impl FileLockStore {
    /// Open the table in `dir`, creating the directory if needed
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            table: Arc::new(LockTable::new(dir.join(LOCK_TABLE_FILE))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.table.path
    }
}

struct LockTable {
    path: PathBuf,
    guard_path: PathBuf,
}

impl LockTable {
    fn new(path: PathBuf) -> Self {
        let guard_path = path.with_extension("json.guard");
        Self { path, guard_path }
    }

    /// Open the guard file; failure here means the store is unreachable
    fn open_guard(&self) -> Result<File, StoreError> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.guard_path)
            .map_err(|e| {
                StoreError::Unavailable(format!(
                    "lock table guard {}: {}",
                    self.guard_path.display(),
                    e
                ))
            })
    }

    fn load(&self) -> Result<Records, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Records::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Records::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, records: &Records) -> Result<(), StoreError> {
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            serde_json::to_writer_pretty(&mut file, records)?;
            file.write_all(b"\n")?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn read(&self) -> Result<Records, StoreError> {
        let guard = self.open_guard()?;
        guard.lock_shared()?;
        // Guard lock is released when `guard` is dropped
        self.load()
    }

    fn compare_and_swap(
        &self,
        expected: Option<&LockRecord>,
        next: LockRecord,
    ) -> Result<bool, StoreError> {
        let guard = self.open_guard()?;
        guard.lock_exclusive()?;

        let mut records = self.load()?;
        if records.get(&next.name) != expected {
            return Ok(false);
        }
        records.insert(next.name.clone(), next);
        self.save(&records)?;
        Ok(true)
    }
}

#[async_trait]
impl LockStore for FileLockStore {
    async fn get(&self, name: &str) -> Result<Option<LockRecord>, StoreError> {
        let table = Arc::clone(&self.table);
        let name = name.to_string();
        blocking(move || Ok(table.read()?.remove(&name))).await
    }

    async fn compare_and_swap(
        &self,
        expected: Option<&LockRecord>,
        next: LockRecord,
    ) -> Result<bool, StoreError> {
        let table = Arc::clone(&self.table);
        let expected = expected.cloned();
        blocking(move || table.compare_and_swap(expected.as_ref(), next)).await
    }

    async fn list(&self) -> Result<Vec<LockRecord>, StoreError> {
        let table = Arc::clone(&self.table);
        blocking(move || Ok(table.read()?.into_values().collect())).await
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
