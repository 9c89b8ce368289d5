// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scanner resources and the capabilities gated by their kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a scanner.
    pub struct ScannerId;
}

/// The kind of engine behind a scanner resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannerKind {
    /// Built-in CVE correlation scanner; runs locally against stored data.
    Cve,
    /// Classical scanner speaking XML over TLS.
    Osp,
    /// OSP scanner deployed as a remote sensor (reached through a relay).
    OspSensor,
    /// Newer scanner speaking JSON over mTLS HTTP.
    HttpScanner,
    HttpScannerSensor,
    /// Agent controller orchestrating deployed agents.
    AgentController,
    AgentControllerSensor,
    /// Container image scanning engine.
    ContainerImage,
}

impl ScannerKind {
    /// Sensors are reached through the relay mapper.
    pub fn is_sensor(&self) -> bool {
        matches!(
            self,
            ScannerKind::OspSensor
                | ScannerKind::HttpScannerSensor
                | ScannerKind::AgentControllerSensor
        )
    }

    /// Whether a stopped task on this scanner can be resumed.
    pub fn supports_resume(&self) -> bool {
        !matches!(
            self,
            ScannerKind::AgentController | ScannerKind::AgentControllerSensor
        )
    }

    /// Whether tasks on this scanner go through the scan queue.
    pub fn supports_queueing(&self) -> bool {
        !matches!(self, ScannerKind::Cve)
    }
}

impl fmt::Display for ScannerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScannerKind::Cve => "CVE",
            ScannerKind::Osp => "OSP",
            ScannerKind::OspSensor => "OSP Sensor",
            ScannerKind::HttpScanner => "HTTP Scanner",
            ScannerKind::HttpScannerSensor => "HTTP Scanner Sensor",
            ScannerKind::AgentController => "Agent Controller",
            ScannerKind::AgentControllerSensor => "Agent Controller Sensor",
            ScannerKind::ContainerImage => "Container Image",
        };
        f.write_str(s)
    }
}

/// A scanner row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scanner {
    pub id: ScannerId,
    pub name: String,
    pub kind: ScannerKind,
    /// Host name or address; ignored when `unix_socket` is set.
    pub host: String,
    pub port: u16,
    /// UNIX-socket path for local scanners.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unix_socket: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
}

impl Scanner {
    pub fn new(
        id: impl Into<ScannerId>,
        name: impl Into<String>,
        kind: ScannerKind,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            host: host.into(),
            port,
            unix_socket: None,
            ca_cert: None,
            client_cert: None,
            client_key: None,
        }
    }
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
