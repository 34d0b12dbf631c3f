// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized job history built from logged operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shed_core::{Completion, HistoryEntry, HistoryId, NewHistoryEntry};
use std::collections::{BTreeMap, HashMap};

/// A single history mutation, as written to the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HistoryOp {
    Start {
        entry: HistoryEntry,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
    },
    Finish {
        id: HistoryId,
        completion: Completion,
        at: DateTime<Utc>,
    },
}

/// History entries keyed (and therefore ordered) by id
#[derive(Debug, Default, Clone)]
pub struct HistoryState {
    entries: BTreeMap<HistoryId, HistoryEntry>,
    requests: HashMap<String, HistoryId>,
}

impl HistoryState {
    /// Id for the next inserted entry
    pub fn next_id(&self) -> HistoryId {
        self.entries
            .keys()
            .next_back()
            .map_or(HistoryId(1), |last| HistoryId(last.0 + 1))
    }

    pub fn get(&self, id: HistoryId) -> Option<&HistoryEntry> {
        self.entries.get(&id)
    }

    /// Whether a `Finish` for `id` would change anything
    pub fn can_finish(&self, id: HistoryId) -> bool {
        self.entries.get(&id).is_some_and(|entry| !entry.is_terminal())
    }

    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry already created for `request_id`, if any
    pub fn started(&self, request_id: &str) -> Option<&HistoryEntry> {
        self.requests
            .get(request_id)
            .and_then(|id| self.entries.get(id))
    }

    /// RUNNING entry for `new` under the next id, and the op that records it
    pub fn start_op(&self, new: NewHistoryEntry) -> (HistoryEntry, HistoryOp) {
        let request_id = new.request_id.clone();
        let entry = HistoryEntry::running(self.next_id(), new);
        let op = HistoryOp::Start {
            entry: entry.clone(),
            request_id: Some(request_id),
        };
        (entry, op)
    }

    /// Apply an operation to update the state. Returns whether it changed anything.
    pub fn apply(&mut self, op: &HistoryOp) -> bool {
        match op {
            HistoryOp::Start { entry, request_id } => {
                if self.entries.contains_key(&entry.id) {
                    return false;
                }
                if let Some(request_id) = request_id {
                    if self.requests.contains_key(request_id) {
                        return false;
                    }
                    self.requests.insert(request_id.clone(), entry.id);
                }
                self.entries.insert(entry.id, entry.clone());
                true
            }

            HistoryOp::Finish { id, completion, at } => match self.entries.get_mut(id) {
                Some(entry) => entry.finish(completion.clone(), *at),
                None => false,
            },
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
