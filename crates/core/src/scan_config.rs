// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan configurations: VT selections and scanner preferences.

use crate::acl::UserId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

crate::define_id! {
    /// Unique identifier for a scan configuration.
    pub struct ScanConfigId;
}

/// One selected VT with its per-script settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VtSelection {
    pub oid: String,
    /// Per-VT timeout in seconds, rendered as a script preference on the
    /// scanner side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
}

impl VtSelection {
    pub fn new(oid: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            timeout: None,
            preferences: BTreeMap::new(),
        }
    }
}

/// A scan configuration row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub id: ScanConfigId,
    pub name: String,
    pub owner: UserId,
    pub vts: Vec<VtSelection>,
    /// Scanner-wide preferences.
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
}

impl ScanConfig {
    pub fn new(id: impl Into<ScanConfigId>, name: impl Into<String>, owner: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner: owner.into(),
            vts: Vec::new(),
            preferences: BTreeMap::new(),
        }
    }
}

/// Cached metadata about one VT, refreshed from the scanner feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VtMeta {
    pub oid: String,
    pub name: String,
    /// Raw tag list as delivered by the scanner.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl VtMeta {
    /// Whether this VT only performs discovery (no vulnerability checks).
    pub fn is_discovery(&self) -> bool {
        self.tags.iter().any(|t| t == "discovery")
    }
}

#[cfg(test)]
#[path = "scan_config_tests.rs"]
mod tests;
