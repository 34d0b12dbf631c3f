// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only history log shared by replicas
//!
//! Each line is one JSON-encoded `HistoryOp`. Writers hold an exclusive
//! `fs2` lock on a sidecar guard file, catch up on lines appended by other
//! processes, then append and fsync. Each handle caches the materialized
//! state and the byte offset it has applied, so catching up only reads new
//! lines.

use crate::state::{HistoryOp, HistoryState};
use crate::store::{blocking, HistoryStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use shed_core::{Completion, HistoryEntry, HistoryId, NewHistoryEntry};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// File name of the history log inside a store directory
pub const HISTORY_LOG_FILE: &str = "history.jsonl";

/// History store persisted as a JSONL operation log
#[derive(Clone)]
pub struct FileHistoryStore {
    log: Arc<HistoryLog>,
}

impl FileHistoryStore {
    /// Open the log in `dir`, creating the directory if needed
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            log: Arc::new(HistoryLog::new(dir.join(HISTORY_LOG_FILE))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.log.path
    }
}

struct HistoryLog {
    path: PathBuf,
    guard_path: PathBuf,
    cache: Mutex<Cache>,
}

#[derive(Default)]
struct Cache {
    /// Bytes of the log already applied to `state`
    offset: u64,
    state: HistoryState,
}

impl HistoryLog {
    fn new(path: PathBuf) -> Self {
        let guard_path = path.with_extension("jsonl.guard");
        Self {
            path,
            guard_path,
            cache: Mutex::new(Cache::default()),
        }
    }

    fn open_guard(&self) -> Result<File, StoreError> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.guard_path)
            .map_err(|e| {
                StoreError::Unavailable(format!(
                    "history log guard {}: {}",
                    self.guard_path.display(),
                    e
                ))
            })
    }

    /// Apply lines appended since the cached offset.
    ///
    /// With `repair`, a torn trailing line (a writer died mid-append) is cut
    /// off so the next append starts on a clean line. Only call with
    /// `repair` while holding the exclusive guard.
    fn catch_up(&self, cache: &mut Cache, repair: bool) -> Result<(), StoreError> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let len = file.metadata()?.len();
        if len < cache.offset {
            // Log was replaced underneath us; rebuild from scratch
            *cache = Cache::default();
        }
        file.seek(SeekFrom::Start(cache.offset))?;

        let mut reader = BufReader::new(file);
        let mut line = String::new();
        loop {
            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            if !line.ends_with('\n') {
                if repair {
                    tracing::warn!(
                        path = %self.path.display(),
                        offset = cache.offset,
                        "truncating torn history log line"
                    );
                    OpenOptions::new()
                        .write(true)
                        .open(&self.path)?
                        .set_len(cache.offset)?;
                }
                break;
            }
            cache.offset += read as u64;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryOp>(trimmed) {
                Ok(op) => {
                    cache.state.apply(&op);
                }
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "skipping unreadable history log line"
                ),
            }
        }
        Ok(())
    }

    fn append(&self, cache: &mut Cache, op: &HistoryOp) -> Result<(), StoreError> {
        let mut line = serde_json::to_string(op)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_all()?;

        cache.offset += line.len() as u64;
        cache.state.apply(op);
        Ok(())
    }

    /// Run `f` against the caught-up state while holding the guard
    fn with_state<T>(
        &self,
        exclusive: bool,
        f: impl FnOnce(&Self, &mut Cache) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let guard = self.open_guard()?;
        if exclusive {
            guard.lock_exclusive()?;
        } else {
            guard.lock_shared()?;
        }
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        self.catch_up(&mut cache, exclusive)?;
        f(self, &mut cache)
    }

    fn insert(&self, new: NewHistoryEntry) -> Result<HistoryEntry, StoreError> {
        self.with_state(true, |log, cache| {
            // A retried insert whose first attempt already landed
            if let Some(entry) = cache.state.started(&new.request_id) {
                return Ok(entry.clone());
            }
            let (entry, op) = cache.state.start_op(new);
            log.append(cache, &op)?;
            Ok(entry)
        })
    }

    fn finish(
        &self,
        id: HistoryId,
        completion: Completion,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.with_state(true, |log, cache| {
            if !cache.state.can_finish(id) {
                return Ok(false);
            }
            log.append(cache, &HistoryOp::Finish { id, completion, at })?;
            Ok(true)
        })
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn insert(&self, new: NewHistoryEntry) -> Result<HistoryEntry, StoreError> {
        let log = Arc::clone(&self.log);
        blocking(move || log.insert(new)).await
    }

    async fn finish(
        &self,
        id: HistoryId,
        completion: Completion,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let log = Arc::clone(&self.log);
        blocking(move || log.finish(id, completion, at)).await
    }

    async fn get(&self, id: HistoryId) -> Result<Option<HistoryEntry>, StoreError> {
        let log = Arc::clone(&self.log);
        blocking(move || log.with_state(false, |_, cache| Ok(cache.state.get(id).cloned()))).await
    }

    async fn list(&self) -> Result<Vec<HistoryEntry>, StoreError> {
        let log = Arc::clone(&self.log);
        blocking(move || log.with_state(false, |_, cache| Ok(cache.state.list()))).await
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
