//! Scenario: stopping a running OSP task.

use crate::prelude::*;
use sentra_adapters::fake::{osp_running, osp_terminal};
use sentra_adapters::OspStatus;
use sentra_core::test_support as fx;
use sentra_core::{ScannerKind, TaskStatus};
use sentra_storage::TaskStore;

#[tokio::test]
async fn stop_walks_requested_waiting_stopped() {
    let h = harness();
    let task = h.seed_task("osp-task", ScannerKind::Osp);
    h.broker.osp.script_statuses(vec![osp_running(30)]);

    h.engine.start_task(&fx::alice(), &task).await.unwrap();
    let report = h.current_report(&task);
    h.wait_for_status(&task, TaskStatus::Running).await;

    // The stop request flips the task; the worker picks it up on its
    // next poll iteration.
    let status = h.engine.stop_task(&fx::alice(), &task).await.unwrap();
    assert_eq!(status, TaskStatus::StopRequested);

    // Wait for the worker to deliver the stop to the scanner, then let
    // the scanner confirm.
    for _ in 0..300 {
        if h.broker.osp.stop_calls() > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(h.broker.osp.stop_calls(), 1);
    h.broker
        .osp
        .script_statuses(vec![osp_terminal(OspStatus::Stopped)]);

    h.drain_workers().await;

    // stop_scan was invoked exactly once; the run record ends Stopped
    // with its end time set to the stop moment.
    assert_eq!(h.broker.osp.stop_calls(), 1);
    assert_eq!(h.status(&task), TaskStatus::Stopped);
    let stored = h.store.get_report(&report).unwrap();
    assert_eq!(stored.run_status, TaskStatus::Stopped);
    assert!(stored.scan_end.is_some());
}
