//! Scenario: starting a CVE correlation task.

use crate::prelude::*;
use sentra_core::test_support as fx;
use sentra_core::{severity_to_level, ScannerKind, SeverityLevel, TaskStatus};
use sentra_storage::{CpeMatchNode, CveEntry, TaskStore};

#[tokio::test]
async fn cve_task_correlates_both_hosts_and_finishes_done() {
    let h = harness();
    let task = h.seed_task("cve-task", ScannerKind::Cve);

    // Each host has a prior report carrying the vulnerable product.
    for host in ["10.0.0.1", "10.0.0.2"] {
        let report = h
            .store
            .create_report(&task, TaskStatus::Requested)
            .unwrap();
        h.store.start_report_host(&report, host, 1_000).unwrap();
        h.store.end_report_host(&report, host, 1_100).unwrap();
        h.store
            .add_host_detail(
                &report,
                host,
                "App",
                "cpe:/a:example:foo",
                "cpe:/a:example:foo:1.2.3",
                None,
            )
            .unwrap();
    }
    h.store.load_match_nodes(vec![(
        CveEntry {
            cve: "CVE-2023-0001".to_string(),
            severity: 7.5,
            description: "Example foo before 1.2.4 is vulnerable.".to_string(),
        },
        CpeMatchNode::Cpe("cpe:/a:example:foo:1.2.3".to_string()),
    )]);

    h.engine.start_task(&fx::alice(), &task).await.unwrap();
    let report = h.current_report(&task);
    h.drain_workers().await;

    assert_eq!(h.status(&task), TaskStatus::Done);

    // One new report with two report-hosts...
    assert_eq!(h.store.report_host_count(&report).unwrap(), 2);

    // ...each carrying one Alarm at severity 7.5 (High) naming the CVE.
    let results = h.store.results(&report).unwrap();
    assert_eq!(results.len(), 2);
    let mut hosts: Vec<&str> = results.iter().map(|r| r.host.as_str()).collect();
    hosts.sort_unstable();
    assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2"]);
    for result in &results {
        assert_eq!(result.severity, 7.5);
        assert_eq!(
            severity_to_level(result.severity),
            Some(SeverityLevel::High)
        );
        assert_eq!(
            sentra_core::severity::result_type(result.severity),
            "Alarm"
        );
        assert!(result.description.contains("CVE-2023-0001"));
    }
    assert_eq!(h.store.report_max_severity(&report).unwrap(), Some(7.5));
}
