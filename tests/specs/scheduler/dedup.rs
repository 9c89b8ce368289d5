//! Scenario: the scheduler deduplicates duplicate grant rows.

use crate::prelude::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use sentra_core::test_support as fx;
use sentra_core::{Clock, Principal, ScannerKind, TaskId};
use sentra_engine::{AuthedSession, ClientConnector, EngineError};
use sentra_storage::TaskStore;
use std::sync::Arc;

#[derive(Default)]
struct CountingConnector {
    starts: Arc<Mutex<Vec<TaskId>>>,
}

struct CountingSession {
    starts: Arc<Mutex<Vec<TaskId>>>,
}

#[async_trait]
impl AuthedSession for CountingSession {
    async fn start_task(&mut self, task: &TaskId) -> Result<(), EngineError> {
        self.starts.lock().push(task.clone());
        Ok(())
    }

    async fn stop_task(&mut self, _task: &TaskId) -> Result<(), EngineError> {
        Ok(())
    }
}

#[async_trait]
impl ClientConnector for CountingConnector {
    async fn connect(&self, _owner: &Principal) -> Result<Box<dyn AuthedSession>, EngineError> {
        Ok(Box::new(CountingSession {
            starts: Arc::clone(&self.starts),
        }))
    }
}

#[tokio::test]
async fn duplicate_grants_fire_one_start_per_tick() {
    let h = harness();
    let task = h.seed_task("sched-task", ScannerKind::Osp);

    h.store
        .insert_schedule(fx::daily_schedule("sched-1", "20240101T000000Z"))
        .unwrap();
    let now = h.clock.now_utc().timestamp();
    let mut t = h.store.get_task(&task).unwrap();
    t.schedule = Some(fx::sid("sched-1"));
    t.schedule_next_time = Some(now);
    h.store.insert_task(t).unwrap();

    // Two grants select the task twice in the schedule iterator.
    h.store.add_schedule_grant_rows(&task, 1);

    let connector = Arc::new(CountingConnector::default());
    let summary = h.engine.schedule_tick(connector.clone()).await.unwrap();

    // Exactly one StartAction per due task per tick.
    assert_eq!(summary.starts, 1);
    assert_eq!(connector.starts.lock().len(), 1);
    assert_eq!(connector.starts.lock()[0], task);

    // The fire time advanced, so the next tick fires nothing.
    let summary = h.engine.schedule_tick(connector.clone()).await.unwrap();
    assert_eq!(summary.starts, 0);
    assert_eq!(connector.starts.lock().len(), 1);
}
