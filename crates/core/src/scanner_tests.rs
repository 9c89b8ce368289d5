// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    osp_sensor = { ScannerKind::OspSensor, true },
    http_sensor = { ScannerKind::HttpScannerSensor, true },
    agent_sensor = { ScannerKind::AgentControllerSensor, true },
    osp = { ScannerKind::Osp, false },
    cve = { ScannerKind::Cve, false },
)]
fn sensor_kinds(kind: ScannerKind, sensor: bool) {
    assert_eq!(kind.is_sensor(), sensor);
}

#[test]
fn agent_controllers_cannot_resume() {
    assert!(!ScannerKind::AgentController.supports_resume());
    assert!(!ScannerKind::AgentControllerSensor.supports_resume());
    assert!(ScannerKind::Osp.supports_resume());
    assert!(ScannerKind::HttpScanner.supports_resume());
}

#[test]
fn cve_scans_bypass_the_queue() {
    assert!(!ScannerKind::Cve.supports_queueing());
    assert!(ScannerKind::Osp.supports_queueing());
}

#[test]
fn kind_display() {
    assert_eq!(ScannerKind::HttpScanner.to_string(), "HTTP Scanner");
    assert_eq!(ScannerKind::Cve.to_string(), "CVE");
}

#[test]
fn scanner_serde_skips_absent_certs() {
    let scanner = Scanner::new("s1", "edge", ScannerKind::Osp, "10.1.1.1", 9390);
    let json = serde_json::to_value(&scanner).unwrap();
    assert!(json.get("ca_cert").is_none());
    assert!(json.get("unix_socket").is_none());
}
