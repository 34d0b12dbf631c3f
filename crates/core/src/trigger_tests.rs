// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn every_minute_cron_fires_on_the_minute() {
    let trigger = Trigger::cron("0 * * * * *").unwrap();
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 30).unwrap();

    let next = trigger.next_after(now).unwrap();

    assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 1, 12, 1, 0).unwrap());
}

#[test]
fn cron_next_is_strictly_after() {
    let trigger = Trigger::cron("0 * * * * *").unwrap();
    let on_tick = Utc.with_ymd_and_hms(2026, 3, 1, 12, 1, 0).unwrap();

    let next = trigger.next_after(on_tick).unwrap();

    assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 1, 12, 2, 0).unwrap());
}

#[test]
fn invalid_cron_is_rejected() {
    let err = Trigger::cron("not a cron").unwrap_err();
    assert!(matches!(err, TriggerError::InvalidCron { ref expr, .. } if expr == "not a cron"));
}

#[test]
fn every_adds_interval() {
    let trigger = Trigger::every(Duration::from_secs(30)).unwrap();
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

    assert_eq!(
        trigger.next_after(now),
        Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 30).unwrap())
    );
}

#[test]
fn zero_interval_is_rejected() {
    assert!(matches!(
        Trigger::every(Duration::ZERO),
        Err(TriggerError::ZeroInterval)
    ));
}

#[test]
fn display_shows_source() {
    let trigger = Trigger::cron("0 * * * * *").unwrap();
    assert_eq!(trigger.to_string(), "cron(0 * * * * *)");
    let trigger = Trigger::every(Duration::from_secs(5)).unwrap();
    assert_eq!(trigger.to_string(), "every(5s)");
}
