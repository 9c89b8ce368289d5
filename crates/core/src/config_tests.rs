// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_are_conservative() {
    let config = ControllerConfig::default();
    assert_eq!(config.scan_poll_interval, DEFAULT_SCAN_POLL_SECS);
    assert_eq!(
        config.report_import_tick_limit,
        DEFAULT_REPORT_IMPORT_TICK_LIMIT
    );
    assert_eq!(config.max_concurrent_scan_updates, 0);
    assert!(!config.scan_queue_enabled());
    assert!(config.schedule_timeout_enabled());
}

#[test]
fn negative_caps_clamp_to_unlimited() {
    let mut config = ControllerConfig::default();
    config.set_max_concurrent_scan_updates(-5);
    assert_eq!(config.max_concurrent_scan_updates, 0);
    config.set_max_concurrent_report_processing(-1);
    assert_eq!(config.max_concurrent_report_processing, 0);
}

#[test]
fn retry_count_floors_at_one() {
    let mut config = ControllerConfig::default();
    config.set_scanner_connection_retry(0);
    assert_eq!(config.scanner_connection_retry, 1);
    config.set_scanner_connection_retry(-3);
    assert_eq!(config.scanner_connection_retry, 1);
    config.set_scanner_connection_retry(7);
    assert_eq!(config.scanner_connection_retry, 7);
}

#[test]
fn schedule_timeout_can_be_disabled() {
    let mut config = ControllerConfig::default();
    config.set_schedule_timeout(0);
    assert!(!config.schedule_timeout_enabled());
    config.set_schedule_timeout(-10);
    assert!(!config.schedule_timeout_enabled());
}

#[test]
fn poll_interval_floors_at_one_second() {
    let mut config = ControllerConfig::default();
    config.set_scan_poll_interval(0);
    assert_eq!(config.scan_poll_interval, 1);
}

#[test]
fn toml_overrides_defaults() {
    let config = ControllerConfig::from_toml(
        "max_concurrent_scan_updates = 4\nfeed_lock_timeout = 30\nschedule_timeout = 5\n",
    )
    .unwrap();
    assert_eq!(config.max_concurrent_scan_updates, 4);
    assert_eq!(config.feed_lock_timeout, 30);
    assert_eq!(config.schedule_timeout, 5);
    // Untouched keys keep their defaults.
    assert_eq!(config.scanner_connection_retry, 3);
}
