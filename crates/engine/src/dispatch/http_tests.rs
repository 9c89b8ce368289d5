// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::dispatch::ScanOutcome;
use crate::test_helpers::bed;
use sentra_adapters::fake::http_status;
use sentra_adapters::{HttpScanPhase, RawScanResult};
use sentra_core::{ScannerKind, StartMode, TaskStatus, VtMeta};
use sentra_storage::TaskStore;

fn result(host: &str, severity: f64) -> RawScanResult {
    RawScanResult {
        host: host.to_string(),
        port: "443/tcp".to_string(),
        oid: "1.3.6.1.4.1.25623.1.0.80109".to_string(),
        severity,
        qod: 75,
        description: "finding".to_string(),
    }
}

#[tokio::test]
async fn succeeded_scan_completes_with_paged_results() {
    let bed = bed();
    let task = bed.seed_task("t1", ScannerKind::HttpScanner);
    bed.give_config(&task, &["1.3.6.1.4.1.25623.1.0.80109"]);
    bed.broker.http.script_statuses(vec![
        http_status(HttpScanPhase::Running, 40),
        http_status(HttpScanPhase::Succeeded, 100),
    ]);
    bed.broker
        .http
        .script_results(vec![result("10.0.0.1", 7.5), result("10.0.0.2", 2.0)]);

    let scan = bed.scan_run("t1");
    let scanner = bed.store.get_scanner(&scan.task.scanner).unwrap();
    let outcome = run(&scan, &scanner).await.unwrap();

    assert_eq!(outcome, ScanOutcome::Completed);
    assert_eq!(bed.status(&task), TaskStatus::Done);
    // Both pages ingested exactly once despite two poll rounds.
    assert_eq!(bed.store.results(&scan.report).unwrap().len(), 2);
}

#[tokio::test]
async fn empty_vt_selection_is_a_hard_error() {
    let bed = bed();
    let task = bed.seed_task("t1", ScannerKind::HttpScanner);
    bed.give_config(&task, &[]);

    let scan = bed.scan_run("t1");
    let err = build_scan_config(&scan).unwrap_err();
    assert_eq!(err.code(), sentra_core::ErrorCode::Conflict);
    assert!(err.to_string().contains("feed not synced"));
}

#[tokio::test]
async fn discovery_flag_requires_all_vts_tagged() {
    let bed = bed();
    let task = bed.seed_task("t1", ScannerKind::HttpScanner);
    bed.give_config(&task, &["oid-ping", "oid-portscan"]);
    bed.store
        .replace_vt_cache(vec![
            VtMeta {
                oid: "oid-ping".to_string(),
                name: "Ping".to_string(),
                tags: vec!["discovery".to_string()],
            },
            VtMeta {
                oid: "oid-portscan".to_string(),
                name: "Ports".to_string(),
                tags: vec!["discovery".to_string()],
            },
        ])
        .unwrap();

    let scan = bed.scan_run("t1");
    let config = build_scan_config(&scan).unwrap();
    assert_eq!(config["discovery"], true);

    // One non-discovery VT flips the flag.
    bed.store
        .replace_vt_cache(vec![
            VtMeta {
                oid: "oid-ping".to_string(),
                name: "Ping".to_string(),
                tags: vec!["discovery".to_string()],
            },
            VtMeta {
                oid: "oid-portscan".to_string(),
                name: "Ports".to_string(),
                tags: vec![],
            },
        ])
        .unwrap();
    let config = build_scan_config(&scan).unwrap();
    assert_eq!(config["discovery"], false);
}

#[tokio::test]
async fn per_vt_timeout_becomes_a_script_preference() {
    let bed = bed();
    let task = bed.seed_task("t1", ScannerKind::HttpScanner);
    let mut config = sentra_core::test_support::scan_config("config-t1", &[]);
    let mut selection = sentra_core::VtSelection::new("oid-slow");
    selection.timeout = Some(320);
    config.vts.push(selection);
    bed.store.insert_scan_config(config).unwrap();
    let mut t = bed.store.get_task(&task).unwrap();
    t.config = Some("config-t1".into());
    bed.store.insert_task(t).unwrap();

    let scan = bed.scan_run("t1");
    let config = build_scan_config(&scan).unwrap();
    assert_eq!(config["vts"][0]["parameters"]["timeout"], "320");
}

#[tokio::test]
async fn resume_reuses_report_and_excludes_finished_hosts() {
    let bed = bed();
    let task = bed.seed_task("t1", ScannerKind::HttpScanner);
    bed.give_config(&task, &["1.3.6.1.4.1.25623.1.0.80109"]);

    // Previous run: 10.0.0.1 finished, 10.0.0.2 still open.
    let mut scan = bed.scan_run("t1");
    bed.store
        .start_report_host(&scan.report, "10.0.0.1", 100)
        .unwrap();
    bed.store
        .end_report_host(&scan.report, "10.0.0.1", 200)
        .unwrap();
    bed.store
        .start_report_host(&scan.report, "10.0.0.2", 100)
        .unwrap();
    scan.mode = StartMode::Resume;

    let config = build_scan_config(&scan).unwrap();
    let excluded: Vec<String> = config["target"]["excluded_hosts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    assert!(excluded.contains(&"10.0.0.1".to_string()));
    assert!(!excluded.contains(&"10.0.0.2".to_string()));
}

#[tokio::test]
async fn failed_scan_interrupts_the_task() {
    let bed = bed();
    let task = bed.seed_task("t1", ScannerKind::HttpScanner);
    bed.give_config(&task, &["1.3.6.1.4.1.25623.1.0.80109"]);
    bed.broker
        .http
        .script_statuses(vec![http_status(HttpScanPhase::Failed, 10)]);

    let scan = bed.scan_run("t1");
    let scanner = bed.store.get_scanner(&scan.task.scanner).unwrap();
    let outcome = run(&scan, &scanner).await.unwrap();
    assert_eq!(outcome, ScanOutcome::Interrupted);
    assert_eq!(bed.status(&task), TaskStatus::Interrupted);
}
