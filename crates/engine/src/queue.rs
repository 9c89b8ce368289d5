// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scan queue: admits queued scans up to the concurrency cap.

use crate::error::EngineError;
use crate::runtime::Engine;
use sentra_adapters::ScanBroker;
use sentra_core::{Clock, StartMode, TaskStatus};

impl<B: ScanBroker, C: Clock> Engine<B, C> {
    /// One queue tick: pop admissible entries and launch their workers.
    ///
    /// The number of running scans never exceeds the configured cap while
    /// the cap is positive; a cap of zero admits everything.
    pub async fn handle_scan_queue(&self) -> Result<usize, EngineError> {
        let cap = self.config().max_concurrent_scan_updates as usize;
        let queued = self.store.scan_queue_len()?;
        if queued == 0 {
            return Ok(0);
        }

        let available = if cap == 0 {
            queued
        } else {
            cap.saturating_sub(self.running_scans())
        };
        if available == 0 {
            return Ok(0);
        }

        let mut admitted = 0;
        for report_id in self.store.scan_queue_take(available)? {
            let report = match self.store.get_report(&report_id) {
                Ok(report) => report,
                Err(e) => {
                    // Deleted while queued; the membership row is gone too.
                    tracing::debug!(report = %report_id, error = %e, "queued report vanished");
                    continue;
                }
            };
            let status = self.store.task_status(&report.task)?;
            if !matches!(status, TaskStatus::Requested | TaskStatus::Queued) {
                tracing::debug!(task = %report.task, %status, "queued task no longer admissible");
                continue;
            }
            // A reused report means this cycle is a resume.
            let mode = if self.store.finished_hosts(&report_id)?.is_empty() {
                StartMode::Start
            } else {
                StartMode::Resume
            };
            self.launch_worker(report.task.clone(), report_id, mode);
            admitted += 1;
        }
        Ok(admitted)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
