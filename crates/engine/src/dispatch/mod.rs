// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanner dispatch: one strategy per scanner kind, sharing the
//! prepare/start/poll/ingest/finalize lifecycle and the result ingestion
//! contract.

pub mod agent;
pub mod cve;
pub mod http;
pub mod osp;

use crate::error::EngineError;
use sentra_adapters::{RawScanResult, ScanBroker};
use sentra_core::{
    severity_to_level, Clock, ControllerConfig, ControllerError, Event, ReportId, ScannerKind,
    StartMode, Task, TaskAction, TaskStatus, Transition,
};
use sentra_storage::TaskStore;
use std::sync::Arc;
use tokio::sync::mpsc;

/// How a dispatched scan ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The scan finished and post-processing completed.
    Completed,
    /// A stop request went through; the task is `Stopped`.
    Stopped,
    /// The scanner reported the scan interrupted; the task is
    /// `Interrupted` with an error result attached.
    Interrupted,
    /// A delete request was observed; the worker tore the scan down and
    /// the controller reclaims the task.
    Deleted,
}

/// Everything one scan run needs, snapshotted at start.
///
/// The original kept this in process-wide globals (current task, current
/// report, current credentials); here it travels with the worker.
pub struct ScanRun<B: ScanBroker, C: Clock> {
    pub store: Arc<dyn TaskStore>,
    pub broker: Arc<B>,
    pub clock: C,
    pub config: ControllerConfig,
    pub task: Task,
    pub report: ReportId,
    pub mode: StartMode,
    pub event_tx: mpsc::Sender<Event>,
}

/// What the control check asks the poll loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    /// A stop was requested; tell the scanner to stop.
    StopScan,
    /// The stop is already with the scanner; keep polling for the ack.
    AwaitingStop,
    /// A delete was requested; tear down.
    Delete,
    /// The task reached a resting state behind the worker's back (e.g.
    /// stopped while still queued); abandon the scanner-side scan.
    Abandon,
}

impl<B: ScanBroker, C: Clock> ScanRun<B, C> {
    /// Wall-clock seconds for scan/host timestamps.
    pub fn now_secs(&self) -> i64 {
        self.clock.now_utc().timestamp()
    }

    pub fn emit(&self, event: Event) {
        if let Err(e) = self.event_tx.try_send(event) {
            tracing::debug!(error = %e, "event channel full, dropping event");
        }
    }

    /// Apply a state-machine action to the task, logging not-applicable
    /// pairs instead of failing the scan.
    pub fn apply(&self, action: TaskAction) -> Result<Option<TaskStatus>, EngineError> {
        let current = self.store.task_status(&self.task.id)?;
        match sentra_core::task::transition(current, action) {
            Transition::To(next) => {
                self.store.set_task_status(&self.task.id, next)?;
                self.emit(Event::TaskStatusChanged {
                    task: self.task.id.clone(),
                    from: current,
                    to: next,
                });
                Ok(Some(next))
            }
            Transition::NotApplicable => {
                tracing::warn!(
                    task = %self.task.id,
                    status = %current,
                    ?action,
                    "state machine pair not applicable"
                );
                Ok(None)
            }
        }
    }

    /// Classify and append a batch of scanner results.
    pub fn ingest(&self, results: Vec<RawScanResult>) -> Result<usize, EngineError> {
        let count = results.len();
        for raw in results {
            // The classification is total on the defined domain; anything
            // else logs a warning and the result is stored level-less.
            let _ = severity_to_level(raw.severity);
            self.store
                .append_result(&self.report, raw.into_scan_result())?;
        }
        if count > 0 {
            self.emit(Event::ResultsIngested {
                report: self.report.clone(),
                count,
            });
        }
        Ok(count)
    }

    /// Observe pending stop/delete requests.
    pub fn control(&self) -> Result<ScanControl, EngineError> {
        Ok(match self.store.task_status(&self.task.id)? {
            TaskStatus::StopRequested => ScanControl::StopScan,
            TaskStatus::StopWaiting => ScanControl::AwaitingStop,
            TaskStatus::DeleteRequested | TaskStatus::DeleteUltimateRequested => {
                ScanControl::Delete
            }
            TaskStatus::Stopped | TaskStatus::Interrupted | TaskStatus::Done => {
                ScanControl::Abandon
            }
            _ => ScanControl::Continue,
        })
    }

    /// Record per-host identifiers and close any still-open report-hosts.
    pub fn finalize_report(&self) -> Result<(), EngineError> {
        let now = self.now_secs();
        for host in self.store.report_hosts(&self.report)? {
            if !host.is_finished() {
                self.store.end_report_host(&self.report, &host.host, now)?;
            }
            self.store.add_host_detail(
                &self.report,
                &host.host,
                "identifier",
                "ip",
                &host.host,
                Some("scan"),
            )?;
        }
        Ok(())
    }

    /// Mark the scan interrupted with a user-visible reason.
    pub fn interrupt(&self, reason: &str) -> Result<(), EngineError> {
        let host = self
            .task
            .target
            .as_ref()
            .and_then(|t| self.store.get_target(t).ok())
            .map(|t| t.hosts)
            .unwrap_or_default();
        self.store.append_result(
            &self.report,
            sentra_core::ScanResult::error_message(host, reason),
        )?;
        self.store
            .set_scan_times(&self.report, None, Some(self.now_secs()))?;
        self.apply(TaskAction::WorkerError)?;
        Ok(())
    }
}

/// Run a task's scan with the strategy its scanner kind selects.
pub async fn run_scan<B: ScanBroker, C: Clock>(
    run: &ScanRun<B, C>,
) -> Result<ScanOutcome, EngineError> {
    let scanner = run.store.get_scanner(&run.task.scanner)?;
    if run.mode == StartMode::Resume && !scanner.kind.supports_resume() {
        return Err(ControllerError::ResumeNotSupported.into());
    }
    match scanner.kind {
        ScannerKind::Cve => cve::run(run).await,
        ScannerKind::Osp | ScannerKind::OspSensor => osp::run(run, &scanner).await,
        ScannerKind::HttpScanner | ScannerKind::HttpScannerSensor => {
            http::run(run, &scanner).await
        }
        ScannerKind::AgentController | ScannerKind::AgentControllerSensor => {
            agent::run(run, &scanner).await
        }
        ScannerKind::ContainerImage => Err(ControllerError::conflict(
            "container image scans are handled by a separate service",
        )
        .into()),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
