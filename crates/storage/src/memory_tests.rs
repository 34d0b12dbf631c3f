// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use shed_core::{HolderId, JobStatus};

fn record(name: &str, holder: &str) -> LockRecord {
    let now = Utc::now();
    LockRecord {
        name: name.to_string(),
        locked_until: now + chrono::TimeDelta::seconds(50),
        locked_at: now,
        locked_by: HolderId::new(holder),
    }
}

fn new_entry(job: &str) -> NewHistoryEntry {
    NewHistoryEntry::new(job, Utc::now(), HolderId::new("pod-a"))
}

#[tokio::test]
async fn cas_inserts_when_absent() {
    let store = MemoryLockStore::new();
    let lock = record("report", "a");

    assert!(store.compare_and_swap(None, lock.clone()).await.unwrap());
    assert_eq!(store.get("report").await.unwrap(), Some(lock));
}

#[tokio::test]
async fn cas_fails_on_stale_expectation() {
    let store = MemoryLockStore::new();
    let first = record("report", "a");
    store.compare_and_swap(None, first.clone()).await.unwrap();

    // A second writer that still believes the row is absent loses
    assert!(!store.compare_and_swap(None, record("report", "b")).await.unwrap());

    // A writer with the right expectation wins
    let next = record("report", "b");
    assert!(store.compare_and_swap(Some(&first), next.clone()).await.unwrap());
    assert_eq!(store.get("report").await.unwrap(), Some(next));
}

#[tokio::test]
async fn clones_share_records() {
    let store = MemoryLockStore::new();
    let replica = store.clone();
    store.compare_and_swap(None, record("report", "a")).await.unwrap();

    assert!(replica.get("report").await.unwrap().is_some());
}

#[tokio::test]
async fn list_is_ordered_by_name() {
    let store = MemoryLockStore::new();
    store.compare_and_swap(None, record("zeta", "a")).await.unwrap();
    store.compare_and_swap(None, record("alpha", "a")).await.unwrap();

    let names: Vec<_> = store
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}

#[tokio::test]
async fn history_insert_assigns_sequential_ids() {
    let store = MemoryHistoryStore::new();
    let a = store.insert(new_entry("report")).await.unwrap();
    let b = store.insert(new_entry("report")).await.unwrap();

    assert_eq!(a.id, HistoryId(1));
    assert_eq!(b.id, HistoryId(2));
    assert_eq!(a.status, JobStatus::Running);
}

#[tokio::test]
async fn history_insert_is_idempotent_per_request() {
    let store = MemoryHistoryStore::new();
    let new = new_entry("report");

    let first = store.insert(new.clone()).await.unwrap();
    let again = store.insert(new).await.unwrap();

    assert_eq!(first, again);
    assert_eq!(store.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn history_finish_is_single_shot() {
    let store = MemoryHistoryStore::new();
    let entry = store.insert(new_entry("report")).await.unwrap();

    assert!(store
        .finish(entry.id, Completion::Success, Utc::now())
        .await
        .unwrap());
    assert!(!store
        .finish(entry.id, Completion::failure("again"), Utc::now())
        .await
        .unwrap());
    assert!(!store
        .finish(HistoryId(99), Completion::Success, Utc::now())
        .await
        .unwrap());

    let entries = store.list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, JobStatus::Success);
}

#[tokio::test]
async fn list_recent_returns_tail() {
    let store = MemoryHistoryStore::new();
    for _ in 0..5 {
        store.insert(new_entry("report")).await.unwrap();
    }

    let recent = store.list_recent(2).await.unwrap();
    let ids: Vec<_> = recent.iter().map(|e| e.id.0).collect();
    assert_eq!(ids, vec![4, 5]);

    assert_eq!(store.list_recent(10).await.unwrap().len(), 5);
}
