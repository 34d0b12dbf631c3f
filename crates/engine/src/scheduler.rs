// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timer queue of upcoming task firings

use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A scheduled firing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledItem {
    pub task: String,
    pub fire_at: DateTime<Utc>,
}

impl PartialOrd for ScheduledItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Min-heap: earliest first, ties by task name
        Reverse((self.fire_at, &self.task)).cmp(&Reverse((other.fire_at, &other.task)))
    }
}

/// Manages upcoming firings
#[derive(Debug, Default)]
pub struct Scheduler {
    items: BinaryHeap<ScheduledItem>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to fire at `fire_at`
    pub fn schedule(&mut self, task: impl Into<String>, fire_at: DateTime<Utc>) {
        self.items.push(ScheduledItem {
            task: task.into(),
            fire_at,
        });
    }

    /// Drop every pending firing of `task`
    pub fn cancel(&mut self, task: &str) {
        self.items.retain(|item| item.task != task);
    }

    /// Remove and return all items due at or before `now`, earliest first
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<ScheduledItem> {
        let mut ready = Vec::new();
        while self.items.peek().is_some_and(|item| item.fire_at <= now) {
            if let Some(item) = self.items.pop() {
                ready.push(item);
            }
        }
        ready
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the next fire time, if any
    pub fn next_fire_time(&self) -> Option<DateTime<Utc>> {
        self.items.peek().map(|item| item.fire_at)
    }

    /// Earliest pending firing of `task`
    pub fn fire_time(&self, task: &str) -> Option<DateTime<Utc>> {
        self.items
            .iter()
            .filter(|item| item.task == task)
            .map(|item| item.fire_at)
            .min()
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
