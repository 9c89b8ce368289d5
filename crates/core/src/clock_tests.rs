// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_starts_pinned() {
    let clock = FakeClock::new();
    assert_eq!(clock.epoch_ms(), 1_704_067_200_000);
    assert_eq!(clock.now_utc().to_rfc3339(), "2024-01-01T00:00:00+00:00");
}

#[test]
fn fake_clock_advances() {
    let clock = FakeClock::new();
    let before = clock.now();
    clock.advance(Duration::from_secs(90));
    assert_eq!(clock.now() - before, Duration::from_secs(90));
    assert_eq!(clock.epoch_ms(), 1_704_067_200_000 + 90_000);
}

#[test]
fn fake_clock_clones_share_state() {
    let clock = FakeClock::new();
    let clone = clock.clone();
    clock.advance(Duration::from_secs(5));
    assert_eq!(clone.epoch_ms(), clock.epoch_ms());
}

#[test]
fn system_clock_moves_forward() {
    let clock = SystemClock;
    let a = clock.epoch_ms();
    let b = clock.epoch_ms();
    assert!(b >= a);
}
