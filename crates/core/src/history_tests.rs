// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;
use yare::parameterized;

fn started() -> HistoryEntry {
    HistoryEntry::running(
        HistoryId(1),
        NewHistoryEntry::new(
            "cluster-report",
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            HolderId::new("pod-a"),
        ),
    )
}

fn end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 2).unwrap()
}

#[test]
fn running_entry_has_no_end() {
    let entry = started();
    assert_eq!(entry.status, JobStatus::Running);
    assert!(entry.end_time.is_none());
    assert!(entry.error_message.is_none());
    assert!(!entry.is_terminal());
}

#[test]
fn finish_success_sets_end_without_message() {
    let mut entry = started();
    assert!(entry.finish(Completion::Success, end()));

    assert_eq!(entry.status, JobStatus::Success);
    assert_eq!(entry.end_time, Some(end()));
    assert!(entry.error_message.is_none());
}

#[test]
fn finish_failure_records_message() {
    let mut entry = started();
    assert!(entry.finish(Completion::failure("disk full"), end()));

    assert_eq!(entry.status, JobStatus::Failure);
    assert_eq!(entry.error_message.as_deref(), Some("disk full"));
    assert_eq!(entry.end_time, Some(end()));
}

#[test]
fn second_finish_is_ignored() {
    let mut entry = started();
    entry.finish(Completion::Success, end());
    let snapshot = entry.clone();

    assert!(!entry.finish(Completion::failure("late"), end()));
    assert_eq!(entry, snapshot);
}

#[test]
fn long_messages_are_truncated() {
    let message = "x".repeat(MAX_ERROR_MESSAGE_LEN + 100);
    let clipped = truncate_message(message);
    assert_eq!(clipped.chars().count(), MAX_ERROR_MESSAGE_LEN);
    assert!(clipped.ends_with('…'));
}

#[test]
fn truncation_respects_char_boundaries() {
    let message = "é".repeat(MAX_ERROR_MESSAGE_LEN + 1);
    let clipped = truncate_message(message);
    assert_eq!(clipped.chars().count(), MAX_ERROR_MESSAGE_LEN);
}

#[test]
fn entry_serializes_with_wire_names() {
    let mut entry = started();
    entry.finish(Completion::failure("boom"), end());
    let json = serde_json::to_value(&entry).unwrap();

    assert_eq!(json["id"], 1);
    assert_eq!(json["jobName"], "cluster-report");
    assert_eq!(json["status"], "FAILURE");
    assert_eq!(json["executedBy"], "pod-a");
    assert_eq!(json["errorMessage"], "boom");
    assert!(json.get("startTime").is_some());
    assert!(json.get("endTime").is_some());
}

#[parameterized(
    running = { "RUNNING", JobStatus::Running },
    success = { "SUCCESS", JobStatus::Success },
    failure = { "failure", JobStatus::Failure },
)]
fn status_parses(input: &str, expected: JobStatus) {
    assert_eq!(input.parse::<JobStatus>(), Ok(expected));
}

#[test]
fn status_parse_rejects_unknown() {
    assert!("PENDING".parse::<JobStatus>().is_err());
}
