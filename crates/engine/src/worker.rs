// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The supervised per-scan worker.
//!
//! One task per scan, owning the poll loop. The worker opens its own
//! store handle (a child never inherits the controller's connection),
//! runs the dispatch strategy and ends with an exit status the
//! controller observes, the way a parent reaps a forked child.

use crate::dispatch::{run_scan, ScanOutcome, ScanRun};
use crate::error::EngineError;
use sentra_adapters::ScanBroker;
use sentra_core::{
    Clock, ControllerConfig, Event, ReportId, ScanResult, StartMode, TaskAction, TaskId,
};
use sentra_storage::{StoreOpener, TaskStore};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Error result recorded when a worker dies before its scan can run.
const SPAWN_ERROR_MESSAGE: &str = "Error forking scan handler. Interrupting scan.";

/// How a worker ended; zero-exit means the scan was driven to a resting
/// state, nonzero asks the controller to reschedule or give up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerExit {
    /// Scan ran to `Done`.
    Completed,
    /// Scan ended `Stopped` after a stop request.
    Stopped,
    /// Scan ended `Interrupted` (scanner failure recorded on the report).
    Interrupted,
    /// A delete request was observed; the controller reclaims the task.
    Deleted,
    /// The worker could not do its job at all.
    Failed(String),
}

impl WorkerExit {
    /// Process-style exit code as observed by the controller.
    pub fn code(&self) -> i32 {
        match self {
            WorkerExit::Completed | WorkerExit::Stopped | WorkerExit::Deleted => 0,
            WorkerExit::Interrupted => 1,
            WorkerExit::Failed(_) => 2,
        }
    }
}

/// A live worker, joinable by the controller.
pub struct WorkerHandle {
    pub task: TaskId,
    pub report: ReportId,
    join: JoinHandle<WorkerExit>,
}

impl WorkerHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Reap the worker; a panicked worker counts as failed.
    pub async fn join(self) -> WorkerExit {
        match self.join.await {
            Ok(exit) => exit,
            Err(e) => WorkerExit::Failed(format!("worker panicked: {e}")),
        }
    }

    pub fn abort(&self) {
        self.join.abort();
    }
}

/// Dependencies a worker carries across the spawn boundary.
pub struct WorkerDeps<B: ScanBroker, C: Clock> {
    pub opener: Arc<dyn StoreOpener>,
    pub broker: Arc<B>,
    pub clock: C,
    pub config: ControllerConfig,
    pub event_tx: mpsc::Sender<Event>,
}

/// Spawn the supervised worker for one scan.
pub fn spawn_scan_worker<B: ScanBroker, C: Clock>(
    deps: WorkerDeps<B, C>,
    task: TaskId,
    report: ReportId,
    mode: StartMode,
) -> WorkerHandle {
    let span = tracing::info_span!("scan_worker", report = %report.short(12));
    let task_for_handle = task.clone();
    let report_for_handle = report.clone();
    let join = tokio::spawn(
        async move { run_worker(deps, task, report, mode).await }.instrument(span),
    );
    WorkerHandle {
        task: task_for_handle,
        report: report_for_handle,
        join,
    }
}

async fn run_worker<B: ScanBroker, C: Clock>(
    deps: WorkerDeps<B, C>,
    task_id: TaskId,
    report: ReportId,
    mode: StartMode,
) -> WorkerExit {
    // Fresh store handle; the controller's is never carried across.
    let store = match deps.opener.open() {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(error = %e, "worker could not open a store handle");
            return WorkerExit::Failed(e.to_string());
        }
    };

    let task = match store.get_task(&task_id) {
        Ok(task) => task,
        Err(e) => {
            tracing::error!(error = %e, "worker could not load its task");
            return WorkerExit::Failed(e.to_string());
        }
    };

    let run = ScanRun {
        store: Arc::clone(&store),
        broker: deps.broker,
        clock: deps.clock,
        config: deps.config,
        task,
        report: report.clone(),
        mode,
        event_tx: deps.event_tx,
    };

    match run_scan(&run).await {
        Ok(ScanOutcome::Completed) => WorkerExit::Completed,
        Ok(ScanOutcome::Stopped) => WorkerExit::Stopped,
        Ok(ScanOutcome::Interrupted) => WorkerExit::Interrupted,
        Ok(ScanOutcome::Deleted) => WorkerExit::Deleted,
        Err(e) => {
            tracing::error!(task = %task_id, error = %e, "scan worker failed");
            interrupt_task(&store, &task_id, &report, &e);
            WorkerExit::Interrupted
        }
    }
}

/// Best-effort terminal bookkeeping for a failed worker: the task must
/// not be left in a transient state with nobody tracking it.
fn interrupt_task(
    store: &Arc<dyn TaskStore>,
    task: &TaskId,
    report: &ReportId,
    error: &EngineError,
) {
    let message = format!("{SPAWN_ERROR_MESSAGE} ({error})");
    if let Err(e) = store.append_result(report, ScanResult::error_message("", &message)) {
        tracing::error!(error = %e, "could not record error result");
    }
    let status = store.task_status(task).ok();
    if let Some(status) = status {
        match sentra_core::task::transition(status, TaskAction::WorkerError) {
            sentra_core::task::Transition::To(next) => {
                if let Err(e) = store.set_task_status(task, next) {
                    tracing::error!(error = %e, "could not interrupt task");
                }
            }
            sentra_core::task::Transition::NotApplicable => {}
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
