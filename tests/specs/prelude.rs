//! Shared harness for the scenario suite.

use sentra_adapters::FakeBroker;
use sentra_core::test_support as fx;
use sentra_core::{ControllerConfig, Event, FakeClock, ReportId, ScannerKind, TaskId, TaskStatus};
use sentra_engine::{Engine, EngineDeps};
use sentra_storage::{MemoryStore, TaskStore};
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct Harness {
    pub engine: Engine<FakeBroker, FakeClock>,
    pub store: MemoryStore,
    pub broker: FakeBroker,
    pub clock: FakeClock,
    #[allow(dead_code)]
    pub event_rx: mpsc::Receiver<Event>,
}

pub fn config() -> ControllerConfig {
    ControllerConfig {
        scan_poll_interval: 0,
        feed_lock_timeout: 0,
        ..ControllerConfig::default()
    }
}

pub fn harness() -> Harness {
    harness_with(config())
}

pub fn harness_with(config: ControllerConfig) -> Harness {
    let store = MemoryStore::new();
    let broker = FakeBroker::new();
    let clock = FakeClock::new();
    let (event_tx, event_rx) = mpsc::channel(512);
    let engine = Engine::new(EngineDeps {
        store: Arc::new(store.clone()),
        opener: Arc::new(store.clone()),
        broker: Arc::new(broker.clone()),
        clock: clock.clone(),
        config,
        event_tx,
        vt_refresh_scanner: None,
    });
    Harness {
        engine,
        store,
        broker,
        clock,
        event_rx,
    }
}

impl Harness {
    /// Insert a task with a scanner of the given kind and a two-host
    /// target of `10.0.0.1,10.0.0.2`.
    pub fn seed_task(&self, id: &str, kind: ScannerKind) -> TaskId {
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

    pub fn give_config(&self, task: &TaskId, oids: &[&str]) {
        let config_id = format!("config-{task}");
        self.store
            .insert_scan_config(fx::scan_config(&config_id, oids))
            .unwrap();
        let mut t = self.store.get_task(task).unwrap();
        t.config = Some(fx::cid(&config_id));
        self.store.insert_task(t).unwrap();
    }

    pub fn status(&self, task: &TaskId) -> TaskStatus {
        self.store.task_status(task).unwrap()
    }

    pub fn current_report(&self, task: &TaskId) -> ReportId {
        self.store
            .get_task(task)
            .unwrap()
            .current_report
            .expect("task has a current report")
    }

    /// Wait until the task reaches `status` (worker progress is async).
    pub async fn wait_for_status(&self, task: &TaskId, status: TaskStatus) {
        for _ in 0..300 {
            if self.status(task) == status {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("task never reached {status}, is {}", self.status(task));
    }

    /// Wait for all workers to finish and reap them.
    pub async fn drain_workers(&self) {
        for _ in 0..300 {
            if self.engine.running_scans() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        self.engine.reap_workers().await;
    }
}
