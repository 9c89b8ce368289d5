// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so time-driven logic is testable without sleeping.

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Source of time for the controller.
///
/// `now()` is monotonic (poll intervals, timeouts); `now_utc()` is wall
/// clock (schedule fire times, scan start/end stamps).
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;
    fn epoch_ms(&self) -> u64;
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System clock for production use
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Controllable clock for tests.
///
/// Starts at a fixed epoch and only moves when `advance` is called.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeClockInner>>,
}

struct FakeClockInner {
    base: Instant,
    offset: Duration,
    epoch_ms: u64,
}

impl FakeClock {
    /// Create a clock pinned to 2024-01-01T00:00:00Z.
    pub fn new() -> Self {
        Self::at_epoch_ms(1_704_067_200_000)
    }

    /// Create a clock pinned to the given epoch milliseconds.
    pub fn at_epoch_ms(epoch_ms: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeClockInner {
                base: Instant::now(),
                offset: Duration::ZERO,
                epoch_ms,
            })),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, by: Duration) {
        let mut inner = self.inner.lock();
        inner.offset += by;
        inner.epoch_ms += by.as_millis() as u64;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        let inner = self.inner.lock();
        inner.base + inner.offset
    }

    fn epoch_ms(&self) -> u64 {
        self.inner.lock().epoch_ms
    }

    fn now_utc(&self) -> DateTime<Utc> {
        let ms = self.epoch_ms();
        Utc.timestamp_millis_opt(ms as i64)
            .single()
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
