// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use shed_core::{HistoryId, HolderId};

fn ctx() -> JobContext {
    JobContext {
        job_name: "report".to_string(),
        executor: HolderId::new("pod-a"),
        started_at: Utc::now(),
        history_id: Some(HistoryId(3)),
    }
}

#[tokio::test]
async fn command_success() {
    CommandJob::new("true").run(ctx()).await.unwrap();
}

#[tokio::test]
async fn command_exit_code_becomes_failure() {
    let err = CommandJob::new("echo 'disk full' >&2; exit 3")
        .run(ctx())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "exit status 3: disk full");
}

#[tokio::test]
async fn command_without_stderr_reports_status() {
    let err = CommandJob::new("exit 1").run(ctx()).await.unwrap_err();
    assert_eq!(err.to_string(), "exit status 1");
}

#[tokio::test]
async fn command_sees_job_environment() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("env.txt");
    let script = format!(
        "echo \"$SHED_JOB_NAME $SHED_EXECUTOR $SHED_HISTORY_ID\" > {}",
        out.display()
    );

    CommandJob::new(script).run(ctx()).await.unwrap();

    let content = std::fs::read_to_string(&out).unwrap();
    assert_eq!(content.trim(), "report pod-a 3");
}

#[tokio::test]
async fn sleep_job_completes() {
    let started = std::time::Instant::now();
    SleepJob::new(Duration::from_millis(10))
        .run(ctx())
        .await
        .unwrap();
    assert!(started.elapsed() >= Duration::from_millis(10));
}

#[test]
fn tail_respects_char_boundaries() {
    assert_eq!(tail("hello", 10), "hello");
    assert_eq!(tail("hello", 3), "llo");
    assert_eq!(tail("aé", 1), "");
}
