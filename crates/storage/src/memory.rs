// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory reference implementation of the store contract.
//!
//! One mutex guards all tables, which gives every operation the
//! transactional visibility the contract promises: a reader that observes
//! a status flip also observes everything written before it.

use crate::contract::{StoreError, StoreOpener, TaskScheduleRow, TaskStore};
use crate::secinfo::{CpeMatchNode, CveEntry};
use parking_lot::Mutex;
use sentra_core::{
    AgentGroup, AgentGroupId, Credential, CredentialId, HostDetail, Permission, Principal, Report,
    ReportHost, ReportId, ScanConfig, ScanConfigId, ScanResult, Scanner, ScannerId, Schedule,
    ScheduleId, Target, TargetId, Task, TaskId, TaskStatus, UserId, VtMeta,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Default)]
struct Tables {
    tasks: HashMap<TaskId, Task>,
    reports: HashMap<ReportId, Report>,
    /// Creation order of reports, the analogue of ascending row ids.
    report_order: Vec<ReportId>,
    results: HashMap<ReportId, Vec<ScanResult>>,
    report_hosts: HashMap<ReportId, Vec<ReportHost>>,
    host_details: HashMap<ReportId, Vec<HostDetail>>,

    scanners: HashMap<ScannerId, Scanner>,
    targets: HashMap<TargetId, Target>,
    credentials: HashMap<CredentialId, Credential>,
    scan_configs: HashMap<ScanConfigId, ScanConfig>,
    schedules: HashMap<ScheduleId, Schedule>,
    agent_groups: HashMap<AgentGroupId, AgentGroup>,

    /// Extra permission grants beyond ownership.
    grants: HashMap<(UserId, TaskId), HashSet<Permission>>,
    /// Extra schedule-iterator rows per task, emulating the grant join.
    schedule_grant_rows: HashMap<TaskId, usize>,

    scan_queue: Vec<ReportId>,
    import_queue: Vec<ReportId>,

    vt_cache: HashMap<String, VtMeta>,

    scap_matching_version: u32,
    /// CVE match trees indexed by every CPE leaf they contain.
    match_nodes: HashMap<String, Vec<(CveEntry, CpeMatchNode)>>,
    affected_products: HashMap<String, Vec<CveEntry>>,

    next_report_seq: u64,
}

/// Shared in-memory store.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `who` a permission on a task (fixture helper; the real ACL
    /// tables live outside the core).
    pub fn grant(&self, who: &UserId, task: &TaskId, permission: Permission) {
        self.inner
            .lock()
            .grants
            .entry((who.clone(), task.clone()))
            .or_default()
            .insert(permission);
    }

    /// Make the schedule iterator yield `extra` duplicate rows for a task,
    /// the way one grant per role duplicates the underlying join.
    pub fn add_schedule_grant_rows(&self, task: &TaskId, extra: usize) {
        *self
            .inner
            .lock()
            .schedule_grant_rows
            .entry(task.clone())
            .or_insert(0) += extra;
    }

    /// Load CVE match trees (matching-version 1 data).
    pub fn load_match_nodes(&self, entries: Vec<(CveEntry, CpeMatchNode)>) {
        let mut inner = self.inner.lock();
        inner.scap_matching_version = 1;
        for (entry, node) in entries {
            for cpe in node.cpes() {
                inner
                    .match_nodes
                    .entry(cpe.to_string())
                    .or_default()
                    .push((entry.clone(), node.clone()));
            }
        }
    }

    /// Load legacy affected-product rows.
    pub fn load_affected_products(&self, cpe: &str, entries: Vec<CveEntry>) {
        self.inner
            .lock()
            .affected_products
            .entry(cpe.to_string())
            .or_default()
            .extend(entries);
    }

    fn allowed(tables: &Tables, id: &TaskId, who: &Principal, permission: Permission) -> bool {
        let Some(task) = tables.tasks.get(id) else {
            return false;
        };
        if task.owner == who.user {
            return true;
        }
        tables
            .grants
            .get(&(who.user.clone(), id.clone()))
            .is_some_and(|perms| perms.contains(&permission))
    }
}

impl StoreOpener for MemoryStore {
    /// The in-memory analogue of opening a fresh connection: workers get
    /// their own `Arc`, never the caller's borrows.
    fn open(&self) -> Result<Arc<dyn TaskStore>, StoreError> {
        Ok(Arc::new(self.clone()))
    }
}

impl TaskStore for MemoryStore {
    fn find_task(
        &self,
        id: &TaskId,
        who: &Principal,
        permission: Permission,
    ) -> Result<Option<Task>, StoreError> {
        let tables = self.inner.lock();
        if !tables.tasks.contains_key(id) {
            return Ok(None);
        }
        if !Self::allowed(&tables, id, who, permission) {
            return Ok(None);
        }
        Ok(tables.tasks.get(id).cloned())
    }

    fn has_permission(
        &self,
        id: &TaskId,
        who: &Principal,
        permission: Permission,
    ) -> Result<bool, StoreError> {
        let tables = self.inner.lock();
        if !tables.tasks.contains_key(id) {
            return Err(StoreError::not_found("task", id.as_str()));
        }
        Ok(Self::allowed(&tables, id, who, permission))
    }

    fn get_task(&self, id: &TaskId) -> Result<Task, StoreError> {
        self.inner
            .lock()
            .tasks
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("task", id.as_str()))
    }

    fn insert_task(&self, task: Task) -> Result<(), StoreError> {
        self.inner.lock().tasks.insert(task.id.clone(), task);
        Ok(())
    }

    fn task_status(&self, id: &TaskId) -> Result<TaskStatus, StoreError> {
        Ok(self.get_task(id)?.status)
    }

    fn set_task_status(&self, id: &TaskId, status: TaskStatus) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let task = tables
            .tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("task", id.as_str()))?;
        task.status = status;
        let current = task.current_report.clone();
        if let Some(report_id) = current {
            if let Some(report) = tables.reports.get_mut(&report_id) {
                // Monotonic progression: never rewind a report's record.
                if status.rank() >= report.run_status.rank() {
                    report.run_status = status;
                }
            }
        }
        Ok(())
    }

    fn set_task_scanner(&self, id: &TaskId, scanner: &ScannerId) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let task = tables
            .tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("task", id.as_str()))?;
        task.scanner = scanner.clone();
        Ok(())
    }

    fn delete_task(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let task = tables
            .tasks
            .remove(id)
            .ok_or_else(|| StoreError::not_found("task", id.as_str()))?;
        let owned: Vec<ReportId> = tables
            .reports
            .iter()
            .filter(|(_, r)| r.task == task.id)
            .map(|(rid, _)| rid.clone())
            .collect();
        for rid in owned {
            tables.reports.remove(&rid);
            tables.results.remove(&rid);
            tables.report_hosts.remove(&rid);
            tables.host_details.remove(&rid);
            tables.report_order.retain(|r| r != &rid);
            tables.scan_queue.retain(|r| r != &rid);
            tables.import_queue.retain(|r| r != &rid);
        }
        Ok(())
    }

    fn create_report(&self, task: &TaskId, init: TaskStatus) -> Result<ReportId, StoreError> {
        let mut tables = self.inner.lock();
        tables.next_report_seq += 1;
        let id = ReportId::new(format!("report-{:06}", tables.next_report_seq));
        let report = Report::new(id.clone(), task.clone(), init);
        let entry = tables
            .tasks
            .get_mut(task)
            .ok_or_else(|| StoreError::not_found("task", task.as_str()))?;
        entry.current_report = Some(id.clone());
        tables.reports.insert(id.clone(), report);
        tables.report_order.push(id.clone());
        Ok(id)
    }

    fn get_report(&self, id: &ReportId) -> Result<Report, StoreError> {
        self.inner
            .lock()
            .reports
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("report", id.as_str()))
    }

    fn last_resumable_report(&self, task: &TaskId) -> Result<Option<ReportId>, StoreError> {
        let tables = self.inner.lock();
        Ok(tables
            .report_order
            .iter()
            .rev()
            .filter_map(|rid| tables.reports.get(rid))
            .find(|r| {
                r.task == *task
                    && matches!(
                        r.run_status,
                        TaskStatus::Stopped | TaskStatus::Interrupted
                    )
            })
            .map(|r| r.id.clone()))
    }

    fn reuse_report(
        &self,
        task: &TaskId,
        report: &ReportId,
        init: TaskStatus,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        {
            let entry = tables
                .reports
                .get_mut(report)
                .ok_or_else(|| StoreError::not_found("report", report.as_str()))?;
            if entry.task != *task {
                return Err(StoreError::Conflict(format!(
                    "report {} does not belong to task {}",
                    report, task
                )));
            }
            entry.run_status = init;
            entry.scan_end = None;
        }
        let entry = tables
            .tasks
            .get_mut(task)
            .ok_or_else(|| StoreError::not_found("task", task.as_str()))?;
        entry.current_report = Some(report.clone());
        Ok(())
    }

    fn set_report_status(&self, report: &ReportId, status: TaskStatus) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let entry = tables
            .reports
            .get_mut(report)
            .ok_or_else(|| StoreError::not_found("report", report.as_str()))?;
        if status.rank() >= entry.run_status.rank() {
            entry.run_status = status;
        }
        Ok(())
    }

    fn trim_partial_report(&self, report: &ReportId) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let unfinished: Vec<String> = tables
            .report_hosts
            .get(report)
            .map(|hosts| {
                hosts
                    .iter()
                    .filter(|h| !h.is_finished())
                    .map(|h| h.host.clone())
                    .collect()
            })
            .unwrap_or_default();
        if let Some(hosts) = tables.report_hosts.get_mut(report) {
            hosts.retain(|h| h.is_finished());
        }
        if let Some(results) = tables.results.get_mut(report) {
            results.retain(|r| !unfinished.contains(&r.host));
        }
        if let Some(details) = tables.host_details.get_mut(report) {
            details.retain(|d| !unfinished.contains(&d.host));
        }
        Ok(())
    }

    fn set_scan_times(
        &self,
        report: &ReportId,
        start: Option<i64>,
        end: Option<i64>,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let entry = tables
            .reports
            .get_mut(report)
            .ok_or_else(|| StoreError::not_found("report", report.as_str()))?;
        if start.is_some() {
            entry.scan_start = start;
        }
        if end.is_some() {
            entry.scan_end = end;
        }
        Ok(())
    }

    fn set_report_progress(&self, report: &ReportId, progress: u8) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let entry = tables
            .reports
            .get_mut(report)
            .ok_or_else(|| StoreError::not_found("report", report.as_str()))?;
        entry.progress = progress.min(100);
        Ok(())
    }

    fn append_result(&self, report: &ReportId, result: ScanResult) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        if !tables.reports.contains_key(report) {
            return Err(StoreError::not_found("report", report.as_str()));
        }
        tables.results.entry(report.clone()).or_default().push(result);
        Ok(())
    }

    fn results(&self, report: &ReportId) -> Result<Vec<ScanResult>, StoreError> {
        Ok(self
            .inner
            .lock()
            .results
            .get(report)
            .cloned()
            .unwrap_or_default())
    }

    fn add_host_detail(
        &self,
        report: &ReportId,
        host: &str,
        kind: &str,
        name: &str,
        value: &str,
        source: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        if !tables.reports.contains_key(report) {
            return Err(StoreError::not_found("report", report.as_str()));
        }
        tables
            .host_details
            .entry(report.clone())
            .or_default()
            .push(HostDetail {
                host: host.to_string(),
                kind: kind.to_string(),
                name: name.to_string(),
                value: value.to_string(),
                source: source.map(str::to_string),
            });
        Ok(())
    }

    fn host_details(&self, report: &ReportId, host: &str) -> Result<Vec<HostDetail>, StoreError> {
        Ok(self
            .inner
            .lock()
            .host_details
            .get(report)
            .map(|details| {
                details
                    .iter()
                    .filter(|d| d.host == host)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn start_report_host(
        &self,
        report: &ReportId,
        host: &str,
        when: i64,
    ) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let hosts = tables.report_hosts.entry(report.clone()).or_default();
        if let Some(existing) = hosts.iter_mut().find(|h| h.host == host) {
            existing.start = Some(when);
        } else {
            hosts.push(ReportHost::started(host, when));
        }
        Ok(())
    }

    fn end_report_host(&self, report: &ReportId, host: &str, when: i64) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let hosts = tables.report_hosts.entry(report.clone()).or_default();
        match hosts.iter_mut().find(|h| h.host == host) {
            Some(existing) => existing.end = Some(when),
            None => hosts.push(ReportHost {
                host: host.to_string(),
                start: None,
                end: Some(when),
            }),
        }
        Ok(())
    }

    fn report_hosts(&self, report: &ReportId) -> Result<Vec<ReportHost>, StoreError> {
        Ok(self
            .inner
            .lock()
            .report_hosts
            .get(report)
            .cloned()
            .unwrap_or_default())
    }

    fn finished_hosts(&self, report: &ReportId) -> Result<Vec<String>, StoreError> {
        Ok(self
            .inner
            .lock()
            .report_hosts
            .get(report)
            .map(|hosts| {
                hosts
                    .iter()
                    .filter(|h| h.is_finished())
                    .map(|h| h.host.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    fn report_host_count(&self, report: &ReportId) -> Result<usize, StoreError> {
        Ok(self
            .inner
            .lock()
            .report_hosts
            .get(report)
            .map(Vec::len)
            .unwrap_or(0))
    }

    fn report_max_severity(&self, report: &ReportId) -> Result<Option<f64>, StoreError> {
        Ok(self
            .inner
            .lock()
            .results
            .get(report)
            .and_then(|results| {
                results
                    .iter()
                    .map(|r| r.severity)
                    .fold(None, |max: Option<f64>, s| {
                        Some(max.map_or(s, |m| if s > m { s } else { m }))
                    })
            }))
    }

    fn delete_reports_older_than(&self, cutoff: i64) -> Result<usize, StoreError> {
        let mut tables = self.inner.lock();
        let victims: Vec<ReportId> = tables
            .reports
            .values()
            .filter(|r| {
                r.run_status == TaskStatus::Done
                    && r.scan_end.is_some_and(|end| end < cutoff)
            })
            .map(|r| r.id.clone())
            .collect();
        let current: HashSet<ReportId> = tables
            .tasks
            .values()
            .filter_map(|t| t.current_report.clone())
            .collect();
        let mut removed = 0;
        for rid in victims {
            if current.contains(&rid) {
                continue;
            }
            tables.reports.remove(&rid);
            tables.results.remove(&rid);
            tables.report_hosts.remove(&rid);
            tables.host_details.remove(&rid);
            tables.report_order.retain(|r| r != &rid);
            removed += 1;
        }
        Ok(removed)
    }

    fn last_report_host(
        &self,
        host: &str,
    ) -> Result<Option<(ReportId, Vec<HostDetail>)>, StoreError> {
        let tables = self.inner.lock();
        let mut best: Option<(i64, usize, ReportId)> = None;
        for (order, rid) in tables.report_order.iter().enumerate() {
            let Some(hosts) = tables.report_hosts.get(rid) else {
                continue;
            };
            let Some(entry) = hosts.iter().find(|h| h.host == host && h.is_finished()) else {
                continue;
            };
            let end = entry.end.unwrap_or(i64::MIN);
            // Ties on scan end break by creation order, newest row winning.
            let candidate = (end, order, rid.clone());
            if best
                .as_ref()
                .is_none_or(|(e, o, _)| (end, order) >= (*e, *o))
            {
                best = Some(candidate);
            }
        }
        Ok(best.map(|(_, _, rid)| {
            let details = tables
                .host_details
                .get(&rid)
                .map(|all| all.iter().filter(|d| d.host == host).cloned().collect())
                .unwrap_or_default();
            (rid, details)
        }))
    }

    fn with_task_schedules(
        &self,
        visit: &mut dyn FnMut(&TaskScheduleRow),
    ) -> Result<(), StoreError> {
        let rows: Vec<TaskScheduleRow> = {
            let tables = self.inner.lock();
            let mut rows = Vec::new();
            for task in tables.tasks.values() {
                let Some(schedule_id) = task.schedule.clone() else {
                    continue;
                };
                let Some(schedule) = tables.schedules.get(&schedule_id) else {
                    continue;
                };
                let row = TaskScheduleRow {
                    task: task.id.clone(),
                    owner: Principal::new(task.owner.clone(), task.owner.as_str()),
                    schedule: schedule_id.clone(),
                    icalendar: schedule.icalendar.clone(),
                    timezone: schedule.timezone.clone(),
                    duration_secs: schedule.duration_secs,
                    next_time: task.schedule_next_time,
                    periods: task.schedule_periods,
                };
                let copies = 1 + tables
                    .schedule_grant_rows
                    .get(&task.id)
                    .copied()
                    .unwrap_or(0);
                for _ in 0..copies {
                    rows.push(row.clone());
                }
            }
            rows
        };
        // The cursor (snapshot) is fully materialized before the visitor
        // runs, so a visitor that mutates the store cannot deadlock.
        for row in &rows {
            visit(row);
        }
        Ok(())
    }

    fn set_task_next_time(&self, task: &TaskId, when: Option<i64>) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let entry = tables
            .tasks
            .get_mut(task)
            .ok_or_else(|| StoreError::not_found("task", task.as_str()))?;
        entry.schedule_next_time = when;
        Ok(())
    }

    fn clear_task_schedule(&self, task: &TaskId) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let entry = tables
            .tasks
            .get_mut(task)
            .ok_or_else(|| StoreError::not_found("task", task.as_str()))?;
        entry.schedule = None;
        entry.schedule_next_time = None;
        entry.schedule_periods = 0;
        Ok(())
    }

    fn set_task_schedule_periods(&self, task: &TaskId, periods: i32) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let entry = tables
            .tasks
            .get_mut(task)
            .ok_or_else(|| StoreError::not_found("task", task.as_str()))?;
        entry.schedule_periods = periods;
        Ok(())
    }

    fn scan_queue_add(&self, report: &ReportId) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        let task_id = tables
            .reports
            .get(report)
            .map(|r| r.task.clone())
            .ok_or_else(|| StoreError::not_found("report", report.as_str()))?;
        let status = tables
            .tasks
            .get(&task_id)
            .map(|t| t.status)
            .ok_or_else(|| StoreError::not_found("task", task_id.as_str()))?;
        if !matches!(status, TaskStatus::Requested | TaskStatus::Queued) {
            return Err(StoreError::Invariant(format!(
                "scan queue membership requires Requested or Queued, task is {status}"
            )));
        }
        if !tables.scan_queue.contains(report) {
            tables.scan_queue.push(report.clone());
        }
        Ok(())
    }

    fn scan_queue_take(&self, limit: usize) -> Result<Vec<ReportId>, StoreError> {
        let mut tables = self.inner.lock();
        let n = limit.min(tables.scan_queue.len());
        Ok(tables.scan_queue.drain(..n).collect())
    }

    fn scan_queue_remove(&self, report: &ReportId) -> Result<(), StoreError> {
        self.inner.lock().scan_queue.retain(|r| r != report);
        Ok(())
    }

    fn scan_queue_len(&self) -> Result<usize, StoreError> {
        Ok(self.inner.lock().scan_queue.len())
    }

    fn queue_report_import(&self, report: &ReportId) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        if !tables.reports.contains_key(report) {
            return Err(StoreError::not_found("report", report.as_str()));
        }
        if !tables.import_queue.contains(report) {
            tables.import_queue.push(report.clone());
        }
        Ok(())
    }

    fn reports_awaiting_processing(&self, limit: usize) -> Result<Vec<ReportId>, StoreError> {
        let tables = self.inner.lock();
        Ok(tables.import_queue.iter().take(limit).cloned().collect())
    }

    fn mark_report_processed(&self, report: &ReportId) -> Result<(), StoreError> {
        self.inner.lock().import_queue.retain(|r| r != report);
        Ok(())
    }

    fn get_scanner(&self, id: &ScannerId) -> Result<Scanner, StoreError> {
        self.inner
            .lock()
            .scanners
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("scanner", id.as_str()))
    }

    fn get_target(&self, id: &TargetId) -> Result<Target, StoreError> {
        self.inner
            .lock()
            .targets
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("target", id.as_str()))
    }

    fn get_credential(&self, id: &CredentialId) -> Result<Credential, StoreError> {
        self.inner
            .lock()
            .credentials
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("credential", id.as_str()))
    }

    fn get_scan_config(&self, id: &ScanConfigId) -> Result<ScanConfig, StoreError> {
        self.inner
            .lock()
            .scan_configs
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("config", id.as_str()))
    }

    fn get_schedule(&self, id: &ScheduleId) -> Result<Schedule, StoreError> {
        self.inner
            .lock()
            .schedules
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("schedule", id.as_str()))
    }

    fn get_agent_group(&self, id: &AgentGroupId) -> Result<AgentGroup, StoreError> {
        self.inner
            .lock()
            .agent_groups
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("agent group", id.as_str()))
    }

    fn insert_scanner(&self, scanner: Scanner) -> Result<(), StoreError> {
        self.inner.lock().scanners.insert(scanner.id.clone(), scanner);
        Ok(())
    }

    fn insert_target(&self, target: Target) -> Result<(), StoreError> {
        self.inner.lock().targets.insert(target.id.clone(), target);
        Ok(())
    }

    fn insert_credential(&self, credential: Credential) -> Result<(), StoreError> {
        self.inner
            .lock()
            .credentials
            .insert(credential.id.clone(), credential);
        Ok(())
    }

    fn insert_scan_config(&self, config: ScanConfig) -> Result<(), StoreError> {
        self.inner
            .lock()
            .scan_configs
            .insert(config.id.clone(), config);
        Ok(())
    }

    fn insert_schedule(&self, schedule: Schedule) -> Result<(), StoreError> {
        self.inner
            .lock()
            .schedules
            .insert(schedule.id.clone(), schedule);
        Ok(())
    }

    fn insert_agent_group(&self, group: AgentGroup) -> Result<(), StoreError> {
        self.inner
            .lock()
            .agent_groups
            .insert(group.id.clone(), group);
        Ok(())
    }

    fn vt_meta(&self, oid: &str) -> Result<Option<VtMeta>, StoreError> {
        Ok(self.inner.lock().vt_cache.get(oid).cloned())
    }

    fn replace_vt_cache(&self, vts: Vec<VtMeta>) -> Result<(), StoreError> {
        let mut tables = self.inner.lock();
        tables.vt_cache = vts.into_iter().map(|v| (v.oid.clone(), v)).collect();
        Ok(())
    }

    fn vt_cache_size(&self) -> Result<usize, StoreError> {
        Ok(self.inner.lock().vt_cache.len())
    }

    fn scap_matching_version(&self) -> Result<u32, StoreError> {
        Ok(self.inner.lock().scap_matching_version)
    }

    fn cves_with_match_nodes(
        &self,
        cpe: &str,
    ) -> Result<Vec<(CveEntry, CpeMatchNode)>, StoreError> {
        Ok(self
            .inner
            .lock()
            .match_nodes
            .get(cpe)
            .cloned()
            .unwrap_or_default())
    }

    fn cves_for_affected_product(&self, cpe: &str) -> Result<Vec<CveEntry>, StoreError> {
        Ok(self
            .inner
            .lock()
            .affected_products
            .get(cpe)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
