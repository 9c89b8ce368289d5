// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::relay::RelayProtocol;
use sentra_core::test_support as fx;
use sentra_core::ScannerKind;

#[tokio::test]
async fn identity_relay_when_no_mapper() {
    let broker = NetworkBroker::new(3, None);
    let relay = broker
        .resolve_relay("sensor.example", 9390, Some("CA"), RelayProtocol::Osp)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(relay.host, "sensor.example");
    assert_eq!(relay.port, 9390);
    assert_eq!(relay.ca_cert.as_deref(), Some("CA"));
}

#[tokio::test]
async fn open_osp_fails_after_retries_for_dead_scanner() {
    // Nothing listens on this port; every attempt must fail fast enough
    // for the retry loop to exhaust.
    let mut scanner = fx::scanner("s1", ScannerKind::Osp);
    scanner.host = "127.0.0.1".to_string();
    scanner.port = 1; // reserved, never listening
    let broker = NetworkBroker::new(2, None);
    let err = broker.open_osp(&scanner).await.unwrap_err();
    assert!(matches!(err, AdapterError::Unreachable(_)));
}

#[test]
fn retry_count_floors_at_one() {
    let broker = NetworkBroker::new(0, None);
    assert_eq!(broker.connection_retry, 1);
}

#[test]
fn protocol_mapping_by_kind() {
    assert_eq!(broker_protocol_for(ScannerKind::Osp), Some("osp"));
    assert_eq!(broker_protocol_for(ScannerKind::OspSensor), Some("osp"));
    assert_eq!(broker_protocol_for(ScannerKind::HttpScanner), Some("http"));
    assert_eq!(
        broker_protocol_for(ScannerKind::AgentControllerSensor),
        Some("agent")
    );
    assert_eq!(broker_protocol_for(ScannerKind::Cve), None);
}
