// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeDelta, Utc};
use shed_core::HolderId;

fn record(name: &str, holder: &str) -> LockRecord {
    let now = Utc::now();
    LockRecord {
        name: name.to_string(),
        locked_until: now + TimeDelta::seconds(50),
        locked_at: now,
        locked_by: HolderId::new(holder),
    }
}

#[tokio::test]
async fn empty_table_has_no_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileLockStore::open(dir.path()).unwrap();

    assert!(store.get("report").await.unwrap().is_none());
    assert!(store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let lock = record("report", "pod-a");

    {
        let store = FileLockStore::open(dir.path()).unwrap();
        assert!(store.compare_and_swap(None, lock.clone()).await.unwrap());
    }

    let store = FileLockStore::open(dir.path()).unwrap();
    assert_eq!(store.get("report").await.unwrap(), Some(lock));
}

#[tokio::test]
async fn cas_rejects_stale_expectation_across_handles() {
    let dir = tempfile::tempdir().unwrap();
    let replica_a = FileLockStore::open(dir.path()).unwrap();
    let replica_b = FileLockStore::open(dir.path()).unwrap();

    assert!(replica_a
        .compare_and_swap(None, record("report", "pod-a"))
        .await
        .unwrap());
    assert!(!replica_b
        .compare_and_swap(None, record("report", "pod-b"))
        .await
        .unwrap());

    let held = replica_b.get("report").await.unwrap().unwrap();
    assert_eq!(held.locked_by, HolderId::new("pod-a"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cas_has_single_winner() {
    let dir = tempfile::tempdir().unwrap();
    let mut handles = Vec::new();

    for i in 0..8 {
        let store = FileLockStore::open(dir.path()).unwrap();
        handles.push(tokio::spawn(async move {
            store
                .compare_and_swap(None, record("nightly-job", &format!("pod-{}", i)))
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test]
async fn table_is_human_readable_json() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileLockStore::open(dir.path()).unwrap();
    store
        .compare_and_swap(None, record("report", "pod-a"))
        .await
        .unwrap();

    let content = std::fs::read_to_string(store.path()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(json["report"]["lockedBy"], "pod-a");
}

#[tokio::test]
async fn missing_directory_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileLockStore::open(&dir.path().join("store")).unwrap();
    std::fs::remove_dir_all(dir.path().join("store")).unwrap();

    let err = store.get("report").await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}
