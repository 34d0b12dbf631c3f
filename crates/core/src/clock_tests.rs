// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn system_clock_returns_increasing_time() {
    let clock = SystemClock;
    let t1 = clock.now();
    std::thread::sleep(Duration::from_millis(2));
    let t2 = clock.now();
    assert!(t2 > t1);
}

#[test]
fn fake_clock_can_be_advanced() {
    let clock = FakeClock::new();
    let t1 = clock.now();
    clock.advance(Duration::from_secs(60));
    let t2 = clock.now();
    assert_eq!(duration_between(t1, t2), Duration::from_secs(60));
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::new();
    let clock2 = clock1.clone();
    let t1 = clock1.now();
    clock2.advance(Duration::from_secs(30));
    let t2 = clock1.now();
    assert_eq!(duration_between(t1, t2), Duration::from_secs(30));
}

#[test]
fn fake_clock_set_overrides_time() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::new();
    clock.set(start);
    assert_eq!(clock.now(), start);
}

#[test]
fn add_duration_saturates() {
    let at = DateTime::<Utc>::MAX_UTC;
    assert_eq!(add_duration(at, Duration::from_secs(1)), DateTime::<Utc>::MAX_UTC);
}

#[test]
fn duration_between_is_zero_when_reversed() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 10).unwrap();
    let earlier = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(duration_between(start, earlier), Duration::ZERO);
}
