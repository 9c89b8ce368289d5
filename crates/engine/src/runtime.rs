// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine value threading everything the task execution core needs.
//!
//! The original kept scanner tasks, the current report and tuning knobs
//! in process-wide globals; here they are fields, and per-scan identity
//! travels with each worker.

use crate::throttle::Throttles;
use crate::worker::{spawn_scan_worker, WorkerDeps, WorkerExit, WorkerHandle};
use parking_lot::Mutex;
use sentra_adapters::ScanBroker;
use sentra_core::{
    Clock, ControllerConfig, Event, ReportId, ScannerId, StartMode, TaskId,
};
use sentra_storage::{StoreOpener, TaskStore};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Engine dependencies.
pub struct EngineDeps<B: ScanBroker, C: Clock> {
    pub store: Arc<dyn TaskStore>,
    pub opener: Arc<dyn StoreOpener>,
    pub broker: Arc<B>,
    pub clock: C,
    pub config: ControllerConfig,
    pub event_tx: mpsc::Sender<Event>,
    /// Scanner whose feed backs the VT cache refresh, if any.
    pub vt_refresh_scanner: Option<ScannerId>,
}

/// The task execution core.
pub struct Engine<B: ScanBroker, C: Clock> {
    pub(crate) store: Arc<dyn TaskStore>,
    pub(crate) opener: Arc<dyn StoreOpener>,
    pub(crate) broker: Arc<B>,
    pub(crate) clock: C,
    pub(crate) config: Mutex<ControllerConfig>,
    pub(crate) throttles: Throttles,
    pub(crate) event_tx: mpsc::Sender<Event>,
    pub(crate) workers: Mutex<Vec<WorkerHandle>>,
    pub(crate) vt_refresh_scanner: Option<ScannerId>,
}

impl<B: ScanBroker, C: Clock> Engine<B, C> {
    pub fn new(deps: EngineDeps<B, C>) -> Self {
        let throttles = Throttles::new(
            deps.config.max_concurrent_scan_updates,
            deps.config.max_concurrent_report_processing,
        );
        Self {
            store: deps.store,
            opener: deps.opener,
            broker: deps.broker,
            clock: deps.clock,
            config: Mutex::new(deps.config),
            throttles,
            event_tx: deps.event_tx,
            workers: Mutex::new(Vec::new()),
            vt_refresh_scanner: deps.vt_refresh_scanner,
        }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> ControllerConfig {
        self.config.lock().clone()
    }

    /// Apply a configuration change.
    pub fn update_config(&self, apply: impl FnOnce(&mut ControllerConfig)) {
        let mut config = self.config.lock();
        apply(&mut config);
    }

    pub fn throttles(&self) -> &Throttles {
        &self.throttles
    }

    pub(crate) fn emit(&self, event: Event) {
        if let Err(e) = self.event_tx.try_send(event) {
            tracing::debug!(error = %e, "event channel full, dropping event");
        }
    }

    pub(crate) fn now_secs(&self) -> i64 {
        self.clock.now_utc().timestamp()
    }

    /// Workers that have not finished yet.
    pub fn running_scans(&self) -> usize {
        self.workers.lock().iter().filter(|w| !w.is_finished()).count()
    }

    /// Launch a worker for a scan and track its handle.
    pub(crate) fn launch_worker(&self, task: TaskId, report: ReportId, mode: StartMode) {
        let deps = WorkerDeps {
            opener: Arc::clone(&self.opener),
            broker: Arc::clone(&self.broker),
            clock: self.clock.clone(),
            config: self.config(),
            event_tx: self.event_tx.clone(),
        };
        let handle = spawn_scan_worker(deps, task, report, mode);
        self.workers.lock().push(handle);
    }

    /// Reap finished workers, performing the controller-side bookkeeping
    /// their exit status asks for. Returns the observed exits.
    pub async fn reap_workers(&self) -> Vec<(TaskId, ReportId, WorkerExit)> {
        let finished: Vec<WorkerHandle> = {
            let mut workers = self.workers.lock();
            let mut finished = Vec::new();
            let mut index = 0;
            while index < workers.len() {
                if workers[index].is_finished() {
                    finished.push(workers.swap_remove(index));
                } else {
                    index += 1;
                }
            }
            finished
        };

        let mut exits = Vec::new();
        for handle in finished {
            let task = handle.task.clone();
            let report = handle.report.clone();
            let exit = handle.join().await;
            tracing::info!(task = %task, report = %report, code = exit.code(), "scan worker exited");
            if exit == WorkerExit::Deleted {
                // The worker stopped the scan; the controller reclaims
                // the task and everything it owns.
                if let Err(e) = self.store.delete_task(&task) {
                    tracing::error!(task = %task, error = %e, "could not reclaim deleted task");
                }
            }
            exits.push((task, report, exit));
        }
        exits
    }

    /// Abort all workers (shutdown path).
    pub fn abort_workers(&self) {
        for worker in self.workers.lock().iter() {
            worker.abort();
        }
    }

    /// Refresh the VT cache from the designated scanner's feed.
    pub async fn refresh_vt_cache(&self) {
        let Some(scanner_id) = &self.vt_refresh_scanner else {
            return;
        };
        let scanner = match self.store.get_scanner(scanner_id) {
            Ok(scanner) => scanner,
            Err(e) => {
                tracing::warn!(error = %e, "VT refresh scanner missing");
                return;
            }
        };
        match self.broker.open_osp(&scanner).await {
            Ok(session) => match session.get_vts().await {
                Ok(vts) => {
                    let count = vts.len();
                    if let Err(e) = self.store.replace_vt_cache(vts) {
                        tracing::error!(error = %e, "could not store VT cache");
                    } else {
                        tracing::debug!(count, "VT cache refreshed");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "VT listing failed"),
            },
            Err(e) => tracing::warn!(error = %e, "VT refresh connection failed"),
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
