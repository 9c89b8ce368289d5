// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Counting throttles for scan updates and report processing.
//!
//! Permits release on drop, so a worker that dies mid-section hands its
//! capacity back instead of consuming it forever.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Outcome of a bounded acquire.
#[derive(Debug)]
pub enum AcquireOutcome {
    /// Capacity granted; hold the permit for the critical section.
    Acquired(OwnedSemaphorePermit),
    /// The wait hit its deadline.
    TimedOut,
    /// The throttle is unbounded; nothing to hold.
    Unbounded,
}

impl AcquireOutcome {
    pub fn is_acquired(&self) -> bool {
        matches!(self, AcquireOutcome::Acquired(_) | AcquireOutcome::Unbounded)
    }
}

/// A named counting semaphore; cap 0 means unbounded.
#[derive(Clone)]
pub struct NamedSemaphore {
    name: &'static str,
    cap: usize,
    semaphore: Arc<Semaphore>,
}

impl NamedSemaphore {
    pub fn new(name: &'static str, cap: usize) -> Self {
        Self {
            name,
            cap,
            semaphore: Arc::new(Semaphore::new(cap.max(1))),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn is_bounded(&self) -> bool {
        self.cap > 0
    }

    /// Permits currently available (meaningless when unbounded).
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a permit, without a deadline.
    pub async fn acquire(&self) -> AcquireOutcome {
        if !self.is_bounded() {
            return AcquireOutcome::Unbounded;
        }
        match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => AcquireOutcome::Acquired(permit),
            // The semaphore is never closed; treat it as a timeout.
            Err(_) => AcquireOutcome::TimedOut,
        }
    }

    /// Wait for a permit up to `timeout`.
    pub async fn acquire_timeout(&self, timeout: Duration) -> AcquireOutcome {
        if !self.is_bounded() {
            return AcquireOutcome::Unbounded;
        }
        match tokio::time::timeout(timeout, self.semaphore.clone().acquire_owned()).await {
            Ok(Ok(permit)) => AcquireOutcome::Acquired(permit),
            Ok(Err(_)) | Err(_) => {
                tracing::debug!(name = self.name, "semaphore wait timed out");
                AcquireOutcome::TimedOut
            }
        }
    }

    /// Take a permit only if one is free right now.
    pub fn try_acquire(&self) -> AcquireOutcome {
        if !self.is_bounded() {
            return AcquireOutcome::Unbounded;
        }
        match self.semaphore.clone().try_acquire_owned() {
            Ok(permit) => AcquireOutcome::Acquired(permit),
            Err(_) => AcquireOutcome::TimedOut,
        }
    }

    /// Wait until every permit is free again (all holders done).
    pub async fn wait_idle(&self) {
        if !self.is_bounded() {
            return;
        }
        if let Ok(permits) = self
            .semaphore
            .clone()
            .acquire_many_owned(self.cap as u32)
            .await
        {
            drop(permits);
        }
    }
}

/// The two throttles the controller mandates.
#[derive(Clone)]
pub struct Throttles {
    pub scan_update: NamedSemaphore,
    pub reports_processing: NamedSemaphore,
}

impl Throttles {
    pub fn new(max_concurrent_scan_updates: u32, max_concurrent_report_processing: u32) -> Self {
        Self {
            scan_update: NamedSemaphore::new("SCAN_UPDATE", max_concurrent_scan_updates as usize),
            reports_processing: NamedSemaphore::new(
                "REPORTS_PROCESSING",
                max_concurrent_report_processing as usize,
            ),
        }
    }
}

#[cfg(test)]
#[path = "throttle_tests.rs"]
mod tests;
