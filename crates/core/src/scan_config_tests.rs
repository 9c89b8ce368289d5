// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn vt_meta_discovery_tag() {
    let mut meta = VtMeta {
        oid: "1.3.6.1.4.1.25623.1.0.100315".to_string(),
        name: "Ping Host".to_string(),
        tags: vec!["discovery".to_string()],
    };
    assert!(meta.is_discovery());
    meta.tags = vec!["remote_vul".to_string()];
    assert!(!meta.is_discovery());
    meta.tags.clear();
    assert!(!meta.is_discovery());
}

#[test]
fn selection_defaults() {
    let sel = VtSelection::new("1.3.6.1.4.1.25623.1.0.80109");
    assert!(sel.timeout.is_none());
    assert!(sel.preferences.is_empty());
}

#[test]
fn config_serde_round_trip() {
    let mut config = ScanConfig::new("cfg-1", "Full and fast", "user-1");
    let mut sel = VtSelection::new("1.3.6.1.4.1.25623.1.0.80109");
    sel.timeout = Some(320);
    config.vts.push(sel);
    let json = serde_json::to_string(&config).unwrap();
    let back: ScanConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.vts[0].timeout, Some(320));
    assert_eq!(back.name, "Full and fast");
}
