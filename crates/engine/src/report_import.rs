// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The report import queue.
//!
//! Externally supplied reports wait in the store until a tick picks them
//! up. Imports of the same report are mutually exclusive through a
//! per-report file lock; total concurrency is bounded by the
//! REPORTS_PROCESSING throttle; each tick handles a bounded batch so it
//! cannot starve the rest of the loop.

use crate::error::EngineError;
use crate::file_lock::FileLock;
use crate::runtime::Engine;
use async_trait::async_trait;
use sentra_adapters::ScanBroker;
use sentra_core::{Clock, Event, ReportId, ScanResult, TaskStatus};
use sentra_storage::TaskStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Performs the actual import work for one report.
#[async_trait]
pub trait ReportImporter: Send + Sync + 'static {
    async fn import(
        &self,
        store: &Arc<dyn TaskStore>,
        report: &ReportId,
    ) -> Result<(), EngineError>;
}

/// Lock file guarding one report's import.
pub fn report_lock_path(state_dir: &Path, report: &ReportId) -> PathBuf {
    state_dir.join(format!("gvm-process-report-{report}"))
}

impl<B: ScanBroker, C: Clock> Engine<B, C> {
    /// One import tick. Returns how many imports completed successfully.
    pub async fn process_report_imports(
        &self,
        importer: Arc<dyn ReportImporter>,
        state_dir: &Path,
    ) -> Result<usize, EngineError> {
        let limit = self.config().report_import_tick_limit;
        let pending = self.store.reports_awaiting_processing(limit)?;
        if pending.is_empty() {
            return Ok(0);
        }

        let mut joins = Vec::new();
        for report in pending {
            // Per-report exclusion first: if another process is importing
            // this report, skip it this tick.
            let lock = match FileLock::try_acquire(&report_lock_path(state_dir, &report)) {
                Ok(Some(lock)) => lock,
                Ok(None) => {
                    tracing::debug!(report = %report, "import lock held, skipping");
                    continue;
                }
                Err(e) => return Err(EngineError::Lock(e)),
            };

            let throttle = self.throttles.reports_processing.clone();
            let importer = Arc::clone(&importer);
            let opener = Arc::clone(&self.opener);
            let event_tx = self.event_tx.clone();
            joins.push(tokio::spawn(async move {
                // Capacity next: waits for a free slot.
                let permit = throttle.acquire().await;
                if !permit.is_acquired() {
                    drop(lock);
                    return false;
                }

                // Imports run with their own store handle, like any child.
                let store = match opener.open() {
                    Ok(store) => store,
                    Err(e) => {
                        tracing::error!(report = %report, error = %e, "import store open failed");
                        drop(lock);
                        return false;
                    }
                };

                let success = match importer.import(&store, &report).await {
                    Ok(()) => {
                        if let Err(e) = store.mark_report_processed(&report) {
                            tracing::error!(report = %report, error = %e, "could not mark processed");
                        }
                        true
                    }
                    Err(e) => {
                        tracing::error!(report = %report, error = %e, "report import failed");
                        fail_report(&store, &report, &e);
                        false
                    }
                };

                let _ = event_tx.try_send(Event::ReportImported {
                    report: report.clone(),
                    success,
                });

                // Capacity and lock go back on every path.
                drop(permit);
                if let Err(e) = lock.release() {
                    tracing::warn!(error = %e, "import lock release failed");
                }
                success
            }));
        }

        let mut succeeded = 0;
        for join in joins {
            match join.await {
                Ok(true) => succeeded += 1,
                Ok(false) => {}
                Err(e) => tracing::error!(error = %e, "import task panicked"),
            }
        }
        Ok(succeeded)
    }
}

/// A failed import leaves the report interrupted with a visible reason,
/// and out of the queue so it is not retried forever.
fn fail_report(store: &Arc<dyn TaskStore>, report: &ReportId, error: &EngineError) {
    let message = format!("Report import failed: {error}");
    if let Err(e) = store.append_result(report, ScanResult::error_message("", &message)) {
        tracing::error!(report = %report, error = %e, "could not attach import error result");
    }
    if let Err(e) = store.set_report_status(report, TaskStatus::Interrupted) {
        tracing::error!(report = %report, error = %e, "could not interrupt report");
    }
    if let Err(e) = store.mark_report_processed(report) {
        tracing::error!(report = %report, error = %e, "could not dequeue failed report");
    }
}

#[cfg(test)]
#[path = "report_import_tests.rs"]
mod tests;
