// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The result shape shared by every scanner family.

use serde::{Deserialize, Serialize};

/// One result as delivered by a scanner, before severity classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawScanResult {
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: String,
    /// VT OID, or an advisory id for correlation results.
    #[serde(default)]
    pub oid: String,
    #[serde(default)]
    pub severity: f64,
    #[serde(default)]
    pub qod: i32,
    #[serde(default)]
    pub description: String,
}

impl RawScanResult {
    /// Convert into the persistent result record.
    pub fn into_scan_result(self) -> sentra_core::ScanResult {
        sentra_core::ScanResult {
            host: self.host,
            port: if self.port.is_empty() {
                "general/tcp".to_string()
            } else {
                self.port
            },
            nvt_oid: self.oid,
            severity: self.severity,
            qod: self.qod,
            description: self.description,
        }
    }
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod tests;
