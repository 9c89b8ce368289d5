// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Report, report-host and result records.

use crate::task::{TaskId, TaskStatus};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a report (one scan run).
    pub struct ReportId;
}

/// Persistent record of one scan run.
///
/// Owned exclusively by its task; deleting the task deletes its reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    pub task: TaskId,
    /// Epoch seconds; `None` until the scan actually starts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_end: Option<i64>,
    /// The scan's terminal record; progresses monotonically.
    pub run_status: TaskStatus,
    /// Reported scan progress, 0..=100.
    #[serde(default)]
    pub progress: u8,
}

impl Report {
    pub fn new(id: impl Into<ReportId>, task: impl Into<TaskId>, init: TaskStatus) -> Self {
        Self {
            id: id.into(),
            task: task.into(),
            scan_start: None,
            scan_end: None,
            run_status: init,
            progress: 0,
        }
    }
}

/// Per-host sub-record of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportHost {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
}

impl ReportHost {
    pub fn started(host: impl Into<String>, start: i64) -> Self {
        Self {
            host: host.into(),
            start: Some(start),
            end: None,
        }
    }

    /// A host is finished once its end time is recorded.
    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }
}

/// Host-level detail attached to a report (installed product, identifier,
/// OS guess, scan timing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDetail {
    pub host: String,
    /// Detail kind, e.g. "App", "OS", "MAC", "hostname".
    pub kind: String,
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// One finding appended to a report. Append-only; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub host: String,
    /// Port specification, e.g. `443/tcp` or `general/tcp`.
    pub port: String,
    /// OID of the VT (or CVE id for correlation results).
    pub nvt_oid: String,
    pub severity: f64,
    /// Quality of detection, 0..=100.
    pub qod: i32,
    pub description: String,
}

impl ScanResult {
    /// A synthetic error-message result, attached so users see why a scan
    /// ended the way it did.
    pub fn error_message(host: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: "general/tcp".to_string(),
            nvt_oid: String::new(),
            severity: crate::severity::SEVERITY_ERROR,
            qod: 0,
            description: description.into(),
        }
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
