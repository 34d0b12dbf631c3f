// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `shed locks`

use crate::output::{format_time, OutputFormat};
use chrono::{DateTime, Utc};
use shed_core::LockRecord;
use shed_daemon::{Config, DaemonPaths};
use shed_storage::{FileLockStore, LockStore, StoreError};
use std::fmt;

/// Text rendering of one lock row
struct Row<'a> {
    record: &'a LockRecord,
    now: DateTime<Utc>,
}

impl fmt::Display for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<32} {:<20} until {} {}",
            self.record.name,
            self.record.locked_by.0,
            format_time(self.record.locked_until),
            if self.record.is_active(self.now) { "held" } else { "free" }
        )
    }
}

pub async fn handle(config: &Config, paths: &DaemonPaths, format: OutputFormat) -> anyhow::Result<()> {
    let records = super::daemon_or_store(
        paths,
        |client| async move { client.locks().await },
        || read_store(config),
    )
    .await?;

    println!("{}", render(&records, format, Utc::now())?);
    Ok(())
}

/// JSON keeps the stored record shape; text adds whether each lock is held
fn render(records: &[LockRecord], format: OutputFormat, now: DateTime<Utc>) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(records),
        OutputFormat::Text if records.is_empty() => Ok("No locks".to_string()),
        OutputFormat::Text => Ok(records
            .iter()
            .map(|record| Row { record, now }.to_string())
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

async fn read_store(config: &Config) -> Result<Vec<LockRecord>, StoreError> {
    // Don't create the store just to report that it is empty
    if !config.scheduler.store_dir.exists() {
        return Ok(Vec::new());
    }
    FileLockStore::open(&config.scheduler.store_dir)?.list().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shed_core::HolderId;

    fn record() -> LockRecord {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        LockRecord {
            name: "ClusterAwareScheduledTask_run".to_string(),
            locked_until: at + chrono::TimeDelta::seconds(50),
            locked_at: at,
            locked_by: HolderId::new("pod-a"),
        }
    }

    #[test]
    fn json_uses_lock_record_fields() {
        let record = record();
        let json = render(std::slice::from_ref(&record), OutputFormat::Json, record.locked_at).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let row = &value[0];
        assert_eq!(row["name"], "ClusterAwareScheduledTask_run");
        assert_eq!(row["lockedBy"], "pod-a");
        assert!(row.get("lockedAt").is_some());
        assert!(row.get("lockedUntil").is_some());
        assert!(row.get("locked_by").is_none());
        assert!(row.get("active").is_none());

        let parsed: Vec<LockRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, vec![record]);
    }

    #[test]
    fn text_marks_expired_locks_free() {
        let record = record();
        let held = render(std::slice::from_ref(&record), OutputFormat::Text, record.locked_at).unwrap();
        let free = render(std::slice::from_ref(&record), OutputFormat::Text, record.locked_until).unwrap();

        assert!(held.ends_with("held"));
        assert!(free.ends_with("free"));
        assert_eq!(render(&[], OutputFormat::Text, record.locked_at).unwrap(), "No locks");
    }
}
