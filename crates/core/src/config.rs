// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Controller tuning knobs.
//!
//! Setters clamp out-of-range values instead of erroring: negative caps
//! mean "disabled"/"unlimited", so a sloppy config file degrades to the
//! permissive behaviour rather than refusing to start.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default interval between scanner polls inside a scan worker.
pub const DEFAULT_SCAN_POLL_SECS: u64 = 25;
/// Default cap on reports imported per tick.
pub const DEFAULT_REPORT_IMPORT_TICK_LIMIT: usize = 10;

/// All tuning knobs of the task execution core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Minutes before an idle authenticated session times out.
    pub auth_timeout: u32,
    /// Message-broker address for event publication; `None` disables it.
    pub broker_address: Option<String>,
    /// Path of the feed lock file.
    pub feed_lock_path: PathBuf,
    /// Seconds to keep retrying the feed lock before reporting busy.
    pub feed_lock_timeout: u64,
    /// Minimum free physical memory (MiB) required to start a feed update.
    pub min_mem_feed_update: u64,
    /// How many scheduler periods to wait for memory before giving up.
    pub mem_wait_retries: u32,
    /// Cap on concurrently running scans; 0 = unlimited.
    pub max_concurrent_scan_updates: u32,
    /// Cap on store connections handed to workers; 0 = unlimited.
    pub max_database_connections: u32,
    /// Cap on concurrently processed report imports; 0 = unlimited.
    pub max_concurrent_report_processing: u32,
    /// Connection attempts per scanner before giving up.
    pub scanner_connection_retry: u32,
    /// Minutes after which a missed scheduled start is skipped; <= 0
    /// disables the timeout.
    pub schedule_timeout: i64,
    /// Relay-mapper executable; `None` means the identity mapping.
    pub relay_mapper_path: Option<PathBuf>,
    /// Seconds between scanner polls inside a scan worker.
    pub scan_poll_interval: u64,
    /// Reports imported per tick.
    pub report_import_tick_limit: usize,
    /// Days after which reports are auto-deleted; 0 disables.
    pub auto_delete_report_days: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            auth_timeout: 15,
            broker_address: None,
            feed_lock_path: PathBuf::from("/var/lib/sentra/feed-update.lock"),
            feed_lock_timeout: 5,
            min_mem_feed_update: 0,
            mem_wait_retries: 30,
            max_concurrent_scan_updates: 0,
            max_database_connections: 0,
            max_concurrent_report_processing: 0,
            scanner_connection_retry: 3,
            schedule_timeout: 60,
            relay_mapper_path: None,
            scan_poll_interval: DEFAULT_SCAN_POLL_SECS,
            report_import_tick_limit: DEFAULT_REPORT_IMPORT_TICK_LIMIT,
            auto_delete_report_days: 0,
        }
    }
}

impl ControllerConfig {
    /// Parse from TOML, falling back to defaults for absent keys.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Set the running-scan cap; negatives clamp to unlimited.
    pub fn set_max_concurrent_scan_updates(&mut self, value: i64) {
        self.max_concurrent_scan_updates = value.max(0) as u32;
    }

    /// Set the report-processing cap; negatives clamp to unlimited.
    pub fn set_max_concurrent_report_processing(&mut self, value: i64) {
        self.max_concurrent_report_processing = value.max(0) as u32;
    }

    /// Set the store-connection cap; negatives clamp to unlimited.
    pub fn set_max_database_connections(&mut self, value: i64) {
        self.max_database_connections = value.max(0) as u32;
    }

    /// Set the per-scanner connection retry count; negatives clamp to one
    /// attempt.
    pub fn set_scanner_connection_retry(&mut self, value: i64) {
        self.scanner_connection_retry = value.clamp(1, i64::from(u32::MAX)) as u32;
    }

    /// Set the schedule timeout in minutes; non-positive disables it.
    pub fn set_schedule_timeout(&mut self, minutes: i64) {
        self.schedule_timeout = minutes;
    }

    /// Set the scan poll interval, floored at one second.
    pub fn set_scan_poll_interval(&mut self, secs: i64) {
        self.scan_poll_interval = secs.max(1) as u64;
    }

    pub fn scan_poll_interval(&self) -> Duration {
        Duration::from_secs(self.scan_poll_interval)
    }

    /// Whether the scan queue bounds concurrency at all.
    pub fn scan_queue_enabled(&self) -> bool {
        self.max_concurrent_scan_updates > 0
    }

    pub fn schedule_timeout_enabled(&self) -> bool {
        self.schedule_timeout > 0
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
