// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::coordinator::INTERRUPTED_REASON;
use crate::lock_manager::LockManager;
use crate::recorder::HistoryRecorder;
use async_trait::async_trait;
use shed_core::{HoldPolicy, HolderId, JobContext, JobError, JobStatus, SystemClock, Trigger};
use shed_storage::{MemoryHistoryStore, MemoryLockStore};
use std::sync::atomic::{AtomicUsize, Ordering};

type TestService = SchedulerService<MemoryLockStore, MemoryHistoryStore, SystemClock>;

/// Sleeps, tracking how many runs overlap
#[derive(Default)]
struct TrackingJob {
    sleep: Duration,
    runs: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl TrackingJob {
    fn new(sleep: Duration) -> Arc<Self> {
        Arc::new(Self {
            sleep,
            ..Self::default()
        })
    }
}

#[async_trait]
impl Job for TrackingJob {
    async fn run(&self, _ctx: JobContext) -> Result<(), JobError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        tokio::time::sleep(self.sleep).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

fn service(history: &MemoryHistoryStore) -> TestService {
    let clock = SystemClock;
    let coordinator = Coordinator::new(
        LockManager::new(MemoryLockStore::new(), clock.clone()),
        HistoryRecorder::new(history.clone(), clock.clone()),
        HolderId::new("pod-a"),
        clock.clone(),
    );
    SchedulerService::new(coordinator, clock).with_poll_interval(Duration::from_millis(10))
}

/// Every `interval`, with a lock that never outlives a short test
fn every(name: &str, interval_ms: u64) -> TaskDef {
    let hold = HoldPolicy::new(Duration::ZERO, Duration::from_millis(1)).unwrap();
    TaskDef::new(
        name,
        Trigger::every(Duration::from_millis(interval_ms)).unwrap(),
        hold,
    )
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let mut service = service(&MemoryHistoryStore::new());
    service
        .register(every("report", 50), TrackingJob::new(Duration::ZERO))
        .unwrap();

    let err = service
        .register(every("report", 50), TrackingJob::new(Duration::ZERO))
        .unwrap_err();
    assert!(matches!(err, ServiceError::DuplicateTask(name) if name == "report"));
}

#[tokio::test]
async fn registered_task_fires_repeatedly() {
    let history = MemoryHistoryStore::new();
    let mut service = service(&history);
    let job = TrackingJob::new(Duration::ZERO);
    service.register(every("report", 30), job.clone()).unwrap();

    let running = service.start();
    tokio::time::sleep(Duration::from_millis(200)).await;
    running.stop().await.unwrap();

    let runs = job.runs.load(Ordering::SeqCst);
    assert!(runs >= 2, "expected several runs, got {}", runs);

    let succeeded = history
        .list()
        .await
        .unwrap()
        .into_iter()
        .filter(|e| e.status == JobStatus::Success)
        .count();
    assert!(succeeded >= 2);
}

#[tokio::test]
async fn overlapping_ticks_are_skipped() {
    let history = MemoryHistoryStore::new();
    let mut service = service(&history);
    let job = TrackingJob::new(Duration::from_millis(120));
    service.register(every("report", 20), job.clone()).unwrap();

    let running = service.start();
    tokio::time::sleep(Duration::from_millis(300)).await;
    running.stop().await.unwrap();

    assert_eq!(job.max_active.load(Ordering::SeqCst), 1);
    // Without skipping, ~15 ticks would have started
    assert!(job.runs.load(Ordering::SeqCst) <= 4);
}

#[tokio::test]
async fn stop_interrupts_running_job() {
    let history = MemoryHistoryStore::new();
    let mut service = service(&history);
    service
        .register(every("report", 20), TrackingJob::new(Duration::from_secs(30)))
        .unwrap();

    let running = service.start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    tokio::time::timeout(Duration::from_secs(5), running.stop())
        .await
        .unwrap()
        .unwrap();

    let entries = history.list().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, JobStatus::Failure);
    assert_eq!(entries[0].error_message.as_deref(), Some(INTERRUPTED_REASON));
}

#[tokio::test]
async fn status_reports_next_fire_time() {
    let mut service = service(&MemoryHistoryStore::new());
    service
        .register(
            every("report", 60_000).with_lock_name("report-lock"),
            TrackingJob::new(Duration::ZERO),
        )
        .unwrap();
    assert_eq!(service.task_names(), vec!["report"]);

    let before = Utc::now();
    let running = service.start();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let tasks = running.tasks();
    running.stop().await.unwrap();

    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].lock_name, "report-lock");
    assert!(!tasks[0].running);
    let next = tasks[0].next_fire.unwrap();
    assert!(next > before + chrono::TimeDelta::seconds(59));
}
