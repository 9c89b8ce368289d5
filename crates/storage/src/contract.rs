// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persistence contract the task execution core is written against.
//!
//! Every mutating operation is transactional in the backing store;
//! `set_task_status` in particular is observed atomically by concurrent
//! readers, and results are published before the status that announces
//! them. Row iteration happens through closure-scoped accessors so the
//! store can release its cursor on every exit path, early returns
//! included.

use crate::secinfo::{CpeMatchNode, CveEntry};
use sentra_core::{
    AgentGroup, AgentGroupId, Credential, CredentialId, HostDetail, Permission, Principal, Report,
    ReportHost, ReportId, ScanConfig, ScanConfigId, ScanResult, Scanner, ScannerId, Schedule,
    ScheduleId, Target, TargetId, Task, TaskId, TaskStatus, UserId, VtMeta,
};
use std::sync::Arc;
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("store conflict: {0}")]
    Conflict(String),

    #[error("store invariant violated: {0}")]
    Invariant(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

/// One row of the scheduled-task iteration.
///
/// The underlying query joins tasks against permission grants, so a task
/// may appear once per grant; the scheduler deduplicates.
#[derive(Debug, Clone)]
pub struct TaskScheduleRow {
    pub task: TaskId,
    pub owner: Principal,
    pub schedule: ScheduleId,
    pub icalendar: String,
    pub timezone: String,
    pub duration_secs: u64,
    /// Stored next fire time (epoch seconds).
    pub next_time: Option<i64>,
    /// Remaining period count; 0 = uncounted.
    pub periods: i32,
}

/// Typed accessor surface over the resource store.
pub trait TaskStore: Send + Sync {
    // === Tasks ===

    /// Look up a task the caller may act on. `None` when the task does not
    /// exist *or* is invisible to the caller; permission failures on a
    /// visible task are reported distinctly.
    fn find_task(
        &self,
        id: &TaskId,
        who: &Principal,
        permission: Permission,
    ) -> Result<Option<Task>, StoreError>;

    /// Whether the caller holds `permission` on the (visible) task.
    fn has_permission(
        &self,
        id: &TaskId,
        who: &Principal,
        permission: Permission,
    ) -> Result<bool, StoreError>;

    fn get_task(&self, id: &TaskId) -> Result<Task, StoreError>;
    fn insert_task(&self, task: Task) -> Result<(), StoreError>;
    fn task_status(&self, id: &TaskId) -> Result<TaskStatus, StoreError>;

    /// Atomically set the task status, mirroring it onto the current
    /// report subject to the monotonic run-status rule.
    fn set_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<(), StoreError>;

    fn set_task_scanner(&self, id: &TaskId, scanner: &ScannerId) -> Result<(), StoreError>;

    /// Delete the task and, transactionally, all its reports and results.
    fn delete_task(&self, id: &TaskId) -> Result<(), StoreError>;

    // === Reports ===

    /// Create a fresh report and make it the task's current report.
    fn create_report(&self, task: &TaskId, init: TaskStatus) -> Result<ReportId, StoreError>;

    fn get_report(&self, id: &ReportId) -> Result<Report, StoreError>;

    /// The task's most recent stopped or interrupted report, if any.
    fn last_resumable_report(&self, task: &TaskId) -> Result<Option<ReportId>, StoreError>;

    /// Reuse an existing report for a resumed run: make it current again
    /// and reset its run status to `init` (the one sanctioned rewind of
    /// the monotonic rule).
    fn reuse_report(
        &self,
        task: &TaskId,
        report: &ReportId,
        init: TaskStatus,
    ) -> Result<(), StoreError>;

    /// Set a report's run status directly (used by report imports, which
    /// have no task transition to mirror). The monotonic rule applies.
    fn set_report_status(&self, report: &ReportId, status: TaskStatus) -> Result<(), StoreError>;

    /// Drop unfinished report-hosts and their results from a report.
    fn trim_partial_report(&self, report: &ReportId) -> Result<(), StoreError>;

    fn set_scan_times(
        &self,
        report: &ReportId,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<(), StoreError>;

    fn set_report_progress(&self, report: &ReportId, progress: u8) -> Result<(), StoreError>;

    fn append_result(&self, report: &ReportId, result: ScanResult) -> Result<(), StoreError>;
    fn results(&self, report: &ReportId) -> Result<Vec<ScanResult>, StoreError>;

    fn add_host_detail(
        &self,
        report: &ReportId,
        host: &str,
        kind: &str,
        name: &str,
        value: &str,
        source: Option<&str>,
    ) -> Result<(), StoreError>;

    fn host_details(&self, report: &ReportId, host: &str) -> Result<Vec<HostDetail>, StoreError>;

    fn start_report_host(&self, report: &ReportId, host: &str, when: i64)
        -> Result<(), StoreError>;
    fn end_report_host(&self, report: &ReportId, host: &str, when: i64) -> Result<(), StoreError>;
    fn report_hosts(&self, report: &ReportId) -> Result<Vec<ReportHost>, StoreError>;

    /// Hosts whose scan finished in this report (used as resume excludes).
    fn finished_hosts(&self, report: &ReportId) -> Result<Vec<String>, StoreError>;

    fn report_host_count(&self, report: &ReportId) -> Result<usize, StoreError>;
    fn report_max_severity(&self, report: &ReportId) -> Result<Option<f64>, StoreError>;

    /// Delete finished reports whose scan ended before the cutoff.
    /// Returns how many were removed.
    fn delete_reports_older_than(&self, cutoff: i64) -> Result<usize, StoreError>;

    /// The most recent finished report-host record for `host` across all
    /// reports, with that report's host details. Ties on scan end break
    /// by report creation order, newest row winning.
    fn last_report_host(
        &self,
        host: &str,
    ) -> Result<Option<(ReportId, Vec<HostDetail>)>, StoreError>;

    // === Schedule iteration ===

    /// Visit every scheduled task row inside one read transaction. The
    /// cursor is released when this returns, on error paths included.
    fn with_task_schedules(
        &self,
        visit: &mut dyn FnMut(&TaskScheduleRow),
    ) -> Result<(), StoreError>;

    fn set_task_next_time(&self, task: &TaskId, when: Option<i64>) -> Result<(), StoreError>;
    fn clear_task_schedule(&self, task: &TaskId) -> Result<(), StoreError>;
    fn set_task_schedule_periods(&self, task: &TaskId, periods: i32) -> Result<(), StoreError>;

    // === Scan queue ===

    /// Add a report to the scan queue. Membership requires the task to be
    /// in `Requested` or `Queued`.
    fn scan_queue_add(&self, report: &ReportId) -> Result<(), StoreError>;

    /// Pop up to `limit` admissible entries in arrival order.
    fn scan_queue_take(&self, limit: usize) -> Result<Vec<ReportId>, StoreError>;

    /// Remove a report from the queue (no-op when absent). Used atomically
    /// with the status change that invalidates membership.
    fn scan_queue_remove(&self, report: &ReportId) -> Result<(), StoreError>;

    fn scan_queue_len(&self) -> Result<usize, StoreError>;

    // === Report import queue ===

    fn queue_report_import(&self, report: &ReportId) -> Result<(), StoreError>;
    fn reports_awaiting_processing(&self, limit: usize) -> Result<Vec<ReportId>, StoreError>;
    fn mark_report_processed(&self, report: &ReportId) -> Result<(), StoreError>;

    // === Referenced resources ===

    fn get_scanner(&self, id: &ScannerId) -> Result<Scanner, StoreError>;
    fn get_target(&self, id: &TargetId) -> Result<Target, StoreError>;
    fn get_credential(&self, id: &CredentialId) -> Result<Credential, StoreError>;
    fn get_scan_config(&self, id: &ScanConfigId) -> Result<ScanConfig, StoreError>;
    fn get_schedule(&self, id: &ScheduleId) -> Result<Schedule, StoreError>;
    fn get_agent_group(&self, id: &AgentGroupId) -> Result<AgentGroup, StoreError>;

    fn insert_scanner(&self, scanner: Scanner) -> Result<(), StoreError>;
    fn insert_target(&self, target: Target) -> Result<(), StoreError>;
    fn insert_credential(&self, credential: Credential) -> Result<(), StoreError>;
    fn insert_scan_config(&self, config: ScanConfig) -> Result<(), StoreError>;
    fn insert_schedule(&self, schedule: Schedule) -> Result<(), StoreError>;
    fn insert_agent_group(&self, group: AgentGroup) -> Result<(), StoreError>;

    // === VT cache ===

    fn vt_meta(&self, oid: &str) -> Result<Option<VtMeta>, StoreError>;
    fn replace_vt_cache(&self, vts: Vec<VtMeta>) -> Result<(), StoreError>;
    fn vt_cache_size(&self) -> Result<usize, StoreError>;

    // === SecInfo (CVE correlation data) ===

    /// SCAP matching-version; 1 means CPE match trees are present.
    fn scap_matching_version(&self) -> Result<u32, StoreError>;

    /// CVEs whose match tree references the CPE (candidate set; the
    /// caller evaluates the tree against the host's full CPE list).
    fn cves_with_match_nodes(
        &self,
        cpe: &str,
    ) -> Result<Vec<(CveEntry, CpeMatchNode)>, StoreError>;

    /// CVEs listing the CPE among their affected products (legacy data).
    fn cves_for_affected_product(&self, cpe: &str) -> Result<Vec<CveEntry>, StoreError>;
}

/// Opens a store handle.
///
/// Scan workers must not share the controller's handle: each worker opens
/// its own connection when it starts, the way a forked child re-opens its
/// database connection.
pub trait StoreOpener: Send + Sync {
    fn open(&self) -> Result<Arc<dyn TaskStore>, StoreError>;
}

/// Narrow helper used by several engine paths.
pub fn owner_principal(task: &Task, name: impl Into<String>) -> Principal {
    Principal {
        user: UserId::new(task.owner.as_str()),
        name: name.into(),
    }
}
