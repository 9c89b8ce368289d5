// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn phase_parses_from_wire_words() {
    let status: HttpScanStatus = serde_json::from_str(
        r#"{"status":"running","progress":37,"start_time":1704067260}"#,
    )
    .unwrap();
    assert_eq!(status.status, HttpScanPhase::Running);
    assert_eq!(status.progress, 37);
    assert_eq!(status.start_time, Some(1704067260));
    assert_eq!(status.end_time, None);
}

#[test]
fn terminal_status_carries_end_time() {
    let status: HttpScanStatus = serde_json::from_str(
        r#"{"status":"succeeded","progress":100,"start_time":1,"end_time":2}"#,
    )
    .unwrap();
    assert_eq!(status.status, HttpScanPhase::Succeeded);
    assert_eq!(status.end_time, Some(2));
}

#[test]
fn create_reply_accepts_bare_and_object_ids() {
    let bare: CreateScanReply = serde_json::from_str("\"scan-42\"").unwrap();
    assert!(matches!(bare, CreateScanReply::Bare(ref id) if id == "scan-42"));
    let object: CreateScanReply = serde_json::from_str(r#"{"id":"scan-43"}"#).unwrap();
    assert!(matches!(object, CreateScanReply::Object { ref id } if id == "scan-43"));
}

#[test]
fn results_deserialize_with_defaults() {
    let results: Vec<crate::results::RawScanResult> = serde_json::from_str(
        r#"[{"host":"10.0.0.1","oid":"1.3.6.1.4.1.25623.1.0.80109","severity":5.0},
            {"host":"10.0.0.2","port":"22/tcp","severity":0.0,"qod":80,"description":"ssh banner"}]"#,
    )
    .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].port, "");
    assert_eq!(results[1].qod, 80);
}

#[test]
fn client_builds_without_key_material() {
    let client = HttpScanClient::new(
        "scanner.example",
        3000,
        None,
        None,
        None,
        std::time::Duration::from_secs(5),
    );
    assert!(client.is_ok());
}
