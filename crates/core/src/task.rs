// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task entity and its run-status state machine.
//!
//! The transition table here is the single source of truth for what a task
//! may do next; the engine and the store both go through it. Every
//! (status, action) pair not listed is a no-op that reports
//! [`Transition::NotApplicable`].

use crate::acl::UserId;
use crate::report::ReportId;
use crate::scan_config::ScanConfigId;
use crate::scanner::ScannerId;
use crate::schedule::ScheduleId;
use crate::target::{AgentGroupId, TargetId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

crate::define_id! {
    /// Unique identifier for a task (the external UUID).
    pub struct TaskId;
}

/// Run status of a task, mirrored onto its current report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    New,
    Requested,
    Queued,
    Running,
    Processing,
    StopRequested,
    StopWaiting,
    Stopped,
    DeleteRequested,
    DeleteUltimateRequested,
    DeleteWaiting,
    DeleteUltimateWaiting,
    Done,
    Interrupted,
}

impl TaskStatus {
    /// True while a scan worker (or the queue) is responsible for the task.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TaskStatus::Requested
                | TaskStatus::Queued
                | TaskStatus::Running
                | TaskStatus::Processing
                | TaskStatus::StopRequested
                | TaskStatus::StopWaiting
                | TaskStatus::DeleteRequested
                | TaskStatus::DeleteUltimateRequested
                | TaskStatus::DeleteWaiting
                | TaskStatus::DeleteUltimateWaiting
        )
    }

    /// True once the run has reached a resting state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::New | TaskStatus::Stopped | TaskStatus::Done | TaskStatus::Interrupted
        )
    }

    /// True when a delete has been requested and teardown is in progress.
    pub fn is_deleting(&self) -> bool {
        matches!(
            self,
            TaskStatus::DeleteRequested
                | TaskStatus::DeleteUltimateRequested
                | TaskStatus::DeleteWaiting
                | TaskStatus::DeleteUltimateWaiting
        )
    }

    /// Ordering rank used to enforce monotonic report run-status progression.
    ///
    /// A report may only move to a status with an equal or higher rank;
    /// terminal states share the top rank so e.g. `Stopped` never becomes
    /// `Running` again on the same report row (a resume creates a fresh
    /// requested cycle by reusing the report through the store, which resets
    /// the row's status explicitly).
    pub fn rank(&self) -> u8 {
        match self {
            TaskStatus::New => 0,
            TaskStatus::Requested => 1,
            TaskStatus::Queued => 2,
            TaskStatus::Running => 3,
            TaskStatus::StopRequested
            | TaskStatus::StopWaiting
            | TaskStatus::DeleteRequested
            | TaskStatus::DeleteUltimateRequested
            | TaskStatus::DeleteWaiting
            | TaskStatus::DeleteUltimateWaiting => 4,
            TaskStatus::Processing => 5,
            TaskStatus::Stopped | TaskStatus::Done | TaskStatus::Interrupted => 6,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::New => "New",
            TaskStatus::Requested => "Requested",
            TaskStatus::Queued => "Queued",
            TaskStatus::Running => "Running",
            TaskStatus::Processing => "Processing",
            TaskStatus::StopRequested => "Stop Requested",
            TaskStatus::StopWaiting => "Stop Waiting",
            TaskStatus::Stopped => "Stopped",
            TaskStatus::DeleteRequested => "Delete Requested",
            TaskStatus::DeleteUltimateRequested => "Ultimate Delete Requested",
            TaskStatus::DeleteWaiting => "Delete Waiting",
            TaskStatus::DeleteUltimateWaiting => "Ultimate Delete Waiting",
            TaskStatus::Done => "Done",
            TaskStatus::Interrupted => "Interrupted",
        };
        f.write_str(s)
    }
}

/// Actions that drive the task state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// A client (or the scheduler) asked the task to start.
    Start,
    /// The scan queue admitted the report for execution.
    Admit,
    /// The scan queue was at capacity when the task was requested.
    QueueFull,
    /// A client asked the task to stop.
    Stop,
    /// The scanner acknowledged the stop request.
    ScannerAck,
    /// The scanner confirmed the scan has ended after a stop.
    ScannerDone,
    /// The scanner reported the scan finished on its own.
    ScanComplete,
    /// Post-processing of the finished scan completed.
    PostDone,
    /// The scan worker hit an unrecoverable error.
    WorkerError,
    /// A client asked a stopped or interrupted task to resume.
    Resume,
    /// A client asked for the task to be deleted (to trashcan).
    Delete,
    /// A client asked for the task to be deleted permanently.
    DeleteUltimate,
    /// The worker observed a pending delete and began teardown.
    DeleteObserved,
}

/// Outcome of applying an action to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The action applies; move to the new status.
    To(TaskStatus),
    /// The (status, action) pair is not in the table.
    NotApplicable,
}

impl Transition {
    pub fn applied(&self) -> Option<TaskStatus> {
        match self {
            Transition::To(s) => Some(*s),
            Transition::NotApplicable => None,
        }
    }
}

/// Apply `action` to `status` per the transition table.
pub fn transition(status: TaskStatus, action: TaskAction) -> Transition {
    use TaskAction as A;
    use TaskStatus as S;

    // A worker error interrupts a task whatever it was doing.
    if action == A::WorkerError {
        return Transition::To(S::Interrupted);
    }

    let next = match (status, action) {
        (S::New, A::Start) => S::Requested,
        (S::Requested, A::Admit) => S::Running,
        (S::Requested, A::QueueFull) => S::Queued,
        (S::Queued, A::Admit) => S::Running,
        (S::Running, A::Stop) => S::StopRequested,
        // A not-yet-running task can be stopped without scanner involvement.
        (S::Requested, A::Stop) | (S::Queued, A::Stop) => S::Stopped,
        (S::StopRequested, A::ScannerAck) => S::StopWaiting,
        (S::StopRequested, A::ScannerDone) => S::Stopped,
        (S::StopWaiting, A::ScannerDone) => S::Stopped,
        // The scanner side can stop a scan without a request from us.
        (S::Running, A::ScannerDone) => S::Stopped,
        (S::Running, A::ScanComplete) => S::Processing,
        (S::Processing, A::PostDone) => S::Done,
        (S::Stopped, A::Resume) | (S::Interrupted, A::Resume) => S::Requested,
        (S::Running, A::Delete) | (S::Queued, A::Delete) => S::DeleteRequested,
        (S::Running, A::DeleteUltimate) | (S::Queued, A::DeleteUltimate) => {
            S::DeleteUltimateRequested
        }
        (S::DeleteRequested, A::DeleteObserved) => S::DeleteWaiting,
        (S::DeleteUltimateRequested, A::DeleteObserved) => S::DeleteUltimateWaiting,
        _ => return Transition::NotApplicable,
    };
    Transition::To(next)
}

/// Whether a start request is allowed from this status.
pub fn can_start(status: TaskStatus) -> bool {
    matches!(
        status,
        TaskStatus::New | TaskStatus::Done | TaskStatus::Stopped | TaskStatus::Interrupted
    )
}

/// Whether a stop request is meaningful from this status.
pub fn can_stop(status: TaskStatus) -> bool {
    matches!(
        status,
        TaskStatus::Requested | TaskStatus::Queued | TaskStatus::Running | TaskStatus::Processing
    )
}

/// Whether a resume request is allowed from this status.
pub fn can_resume(status: TaskStatus) -> bool {
    matches!(status, TaskStatus::Stopped | TaskStatus::Interrupted)
}

/// Whether the task is quiescent enough to be moved to another scanner.
pub fn can_move(status: TaskStatus) -> bool {
    matches!(
        status,
        TaskStatus::New | TaskStatus::Done | TaskStatus::Stopped
    )
}

/// How a scan run was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Fresh run: a new report is created.
    Start,
    /// Continue the last stopped run: the report is reused, partial host
    /// data trimmed, finished hosts excluded.
    Resume,
}

/// A task row.
///
/// Target, config and schedule are weak references looked up on each run;
/// editing those resources never affects an in-flight scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub owner: UserId,
    pub comment: String,
    pub scanner: ScannerId,
    pub target: Option<TargetId>,
    pub config: Option<ScanConfigId>,
    pub schedule: Option<ScheduleId>,
    pub agent_group: Option<AgentGroupId>,
    /// Task preferences (poll interval overrides, queue hints, radio
    /// selections in `chosen;alt1;alt2` form).
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
    pub status: TaskStatus,
    /// The one report a running cycle writes into.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_report: Option<ReportId>,
    /// Next scheduled fire time (epoch seconds); `None` when unscheduled
    /// or the recurrence is exhausted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_next_time: Option<i64>,
    /// Remaining period count for bounded schedules; 0 means uncounted.
    #[serde(default)]
    pub schedule_periods: i32,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, name: impl Into<String>, owner: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner: owner.into(),
            comment: String::new(),
            scanner: ScannerId::new(""),
            target: None,
            config: None,
            schedule: None,
            agent_group: None,
            preferences: BTreeMap::new(),
            status: TaskStatus::New,
            current_report: None,
            schedule_next_time: None,
            schedule_periods: 0,
        }
    }

    /// Value of a radio-style preference: the chosen alternative is the
    /// first `;`-separated field. An empty first field is kept as-is.
    pub fn radio_preference(&self, name: &str) -> Option<&str> {
        self.preferences
            .get(name)
            .map(|v| v.split(';').next().unwrap_or(""))
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
