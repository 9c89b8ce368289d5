//! Scenario: resuming a stopped HTTP-scanner task.

use crate::prelude::*;
use sentra_adapters::fake::http_status;
use sentra_adapters::HttpScanPhase;
use sentra_core::test_support as fx;
use sentra_core::{ScannerKind, TaskStatus};
use sentra_storage::TaskStore;

#[tokio::test]
async fn resume_excludes_finished_hosts_and_reuses_the_report() {
    let h = harness();
    let task = h.seed_task("http-task", ScannerKind::HttpScanner);
    h.give_config(&task, &["1.3.6.1.4.1.25623.1.0.80109"]);

    // A previous run finished 10.0.0.1 and left 10.0.0.2 open, then
    // stopped.
    let report = h
        .store
        .create_report(&task, TaskStatus::Requested)
        .unwrap();
    h.store.start_report_host(&report, "10.0.0.1", 100).unwrap();
    h.store.end_report_host(&report, "10.0.0.1", 200).unwrap();
    h.store.start_report_host(&report, "10.0.0.2", 100).unwrap();
    h.store
        .add_host_detail(&report, "10.0.0.2", "App", "cpe", "cpe:/a:partial", None)
        .unwrap();
    h.store.set_task_status(&task, TaskStatus::Stopped).unwrap();

    h.broker.http.script_statuses(vec![
        http_status(HttpScanPhase::Running, 50),
        http_status(HttpScanPhase::Succeeded, 100),
    ]);

    let status = h.engine.resume_task(&fx::alice(), &task).await.unwrap();
    assert_eq!(status, TaskStatus::Requested);

    // Same report is reused; the unfinished host's partial data is gone.
    assert_eq!(h.current_report(&task), report);
    let hosts = h.store.report_hosts(&report).unwrap();
    assert_eq!(hosts.len(), 1);
    assert_eq!(hosts[0].host, "10.0.0.1");
    assert!(h
        .store
        .host_details(&report, "10.0.0.2")
        .unwrap()
        .is_empty());

    h.drain_workers().await;
    assert_eq!(h.status(&task), TaskStatus::Done);

    // The scan config sent to the scanner excluded the finished host.
    let configs = h.broker.http.created_configs();
    assert_eq!(configs.len(), 1);
    let excluded: Vec<&str> = configs[0]["target"]["excluded_hosts"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert!(excluded.contains(&"10.0.0.1"));
    assert!(!excluded.contains(&"10.0.0.2"));
}
