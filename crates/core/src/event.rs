// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events emitted by the engine for the controller loop and its log.

use crate::report::ReportId;
use crate::task::{TaskId, TaskStatus};
use serde::{Deserialize, Serialize};

/// Lifecycle notifications produced while driving scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    TaskStatusChanged {
        task: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
    ReportCreated {
        task: TaskId,
        report: ReportId,
    },
    ScanProgress {
        report: ReportId,
        progress: u8,
    },
    ResultsIngested {
        report: ReportId,
        count: usize,
    },
    ScheduleFired {
        task: TaskId,
        stop: bool,
    },
    ReportImported {
        report: ReportId,
        success: bool,
    },
    FeedSyncFinished {
        kind: String,
        success: bool,
    },
}

impl Event {
    /// Compact one-line summary for log output.
    pub fn log_summary(&self) -> String {
        match self {
            Event::TaskStatusChanged { task, from, to } => {
                format!("task {} {} -> {}", task.short(8), from, to)
            }
            Event::ReportCreated { task, report } => {
                format!("report {} created for task {}", report.short(8), task.short(8))
            }
            Event::ScanProgress { report, progress } => {
                format!("report {} progress {}%", report.short(8), progress)
            }
            Event::ResultsIngested { report, count } => {
                format!("report {} ingested {} results", report.short(8), count)
            }
            Event::ScheduleFired { task, stop } => {
                let what = if *stop { "stop" } else { "start" };
                format!("schedule {} for task {}", what, task.short(8))
            }
            Event::ReportImported { report, success } => {
                format!("report {} import success={}", report.short(8), success)
            }
            Event::FeedSyncFinished { kind, success } => {
                format!("feed sync {} success={}", kind, success)
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
