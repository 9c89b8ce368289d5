// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::dispatch::ScanRun;
use crate::runtime::{Engine, EngineDeps};
use sentra_adapters::FakeBroker;
use sentra_core::test_support as fx;
use sentra_core::{
    ControllerConfig, Event, FakeClock, ReportId, ScannerKind, StartMode, TaskId, TaskStatus,
};
use sentra_storage::{MemoryStore, TaskStore};
use std::sync::Arc;
use tokio::sync::mpsc;

pub(crate) struct TestBed {
    pub engine: Engine<FakeBroker, FakeClock>,
    pub store: MemoryStore,
    pub broker: FakeBroker,
    pub clock: FakeClock,
    pub event_rx: mpsc::Receiver<Event>,
}

/// Config tuned for tests: no poll delay, bounded nothing.
pub(crate) fn test_config() -> ControllerConfig {
    ControllerConfig {
        scan_poll_interval: 0,
        feed_lock_timeout: 0,
        ..ControllerConfig::default()
    }
}

pub(crate) fn bed() -> TestBed {
    bed_with_config(test_config())
}

pub(crate) fn bed_with_config(config: ControllerConfig) -> TestBed {
    let store = MemoryStore::new();
    let broker = FakeBroker::new();
    let clock = FakeClock::new();
    let (event_tx, event_rx) = mpsc::channel(256);
    let engine = Engine::new(EngineDeps {
        store: Arc::new(store.clone()),
        opener: Arc::new(store.clone()),
        broker: Arc::new(broker.clone()),
        clock: clock.clone(),
        config,
        event_tx,
        vt_refresh_scanner: None,
    });
    TestBed {
        engine,
        store,
        broker,
        clock,
        event_rx,
    }
}

impl TestBed {
    /// Insert a task bound to a scanner of the given kind, with a target.
    pub(crate) fn seed_task(&self, id: &str, kind: ScannerKind) -> TaskId {
        let scanner_id = format!("scanner-{id}");
        let scanner = match kind {
            ScannerKind::Cve => fx::cve_scanner(&scanner_id),
            other => fx::scanner(&scanner_id, other),
        };
        self.store.insert_scanner(scanner).unwrap();
        let target_id = format!("target-{id}");
        self.store
            .insert_target(fx::target(&target_id, "10.0.0.1,10.0.0.2"))
            .unwrap();
        let mut task = fx::task(id, &scanner_id);
        task.target = Some(fx::tgid(&target_id));
        self.store.insert_task(task).unwrap();
        TaskId::new(id)
    }

    /// Add a scan config with the given VT OIDs to a task.
    pub(crate) fn give_config(&self, task: &TaskId, oids: &[&str]) {
        let config_id = format!("config-{task}");
        self.store
            .insert_scan_config(fx::scan_config(&config_id, oids))
            .unwrap();
        let mut t = self.store.get_task(task).unwrap();
        t.config = Some(fx::cid(&config_id));
        self.store.insert_task(t).unwrap();
    }

    pub(crate) fn status(&self, task: &TaskId) -> TaskStatus {
        self.store.task_status(task).unwrap()
    }

    pub(crate) fn current_report(&self, task: &TaskId) -> ReportId {
        self.store
            .get_task(task)
            .unwrap()
            .current_report
            .expect("task has a current report")
    }

    /// Build a `ScanRun` for dispatch tests: a fresh requested report on
    /// the given (already seeded) task.
    pub(crate) fn scan_run(&self, task_id: &str) -> ScanRun<FakeBroker, FakeClock> {
        let task = self.store.get_task(&fx::tid(task_id)).unwrap();
        let report = self
            .store
            .create_report(&task.id, TaskStatus::Requested)
            .unwrap();
        self.store
            .set_task_status(&task.id, TaskStatus::Requested)
            .unwrap();
        let task = self.store.get_task(&task.id).unwrap();
        ScanRun {
            store: Arc::new(self.store.clone()),
            broker: Arc::new(self.broker.clone()),
            clock: self.clock.clone(),
            config: test_config(),
            task,
            report,
            mode: StartMode::Start,
            event_tx: mpsc::channel(64).0,
        }
    }

    /// Wait for every live worker to finish and reap them.
    pub(crate) async fn drain_workers(&self) -> Vec<crate::worker::WorkerExit> {
        let mut exits = Vec::new();
        for _ in 0..200 {
            if self.engine.running_scans() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        for (_, _, exit) in self.engine.reap_workers().await {
            exits.push(exit);
        }
        exits
    }
}
