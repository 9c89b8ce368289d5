// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task lifecycle entry points: start, stop, resume, delete, move.
//!
//! Every operation takes an explicit principal and checks the matching
//! permission before touching the task.

use crate::error::EngineError;
use crate::runtime::Engine;
use sentra_adapters::ScanBroker;
use sentra_core::task::{can_move, can_resume, can_start, can_stop, transition, Transition};
use sentra_core::{
    Clock, ControllerError, Event, Permission, Principal, ScannerId, StartMode, Task, TaskAction,
    TaskId, TaskStatus,
};
use std::time::Duration;

/// How long `move_task` waits for a running scan to stop.
const MOVE_STOP_WAIT: Duration = Duration::from_secs(600);
const MOVE_STOP_POLL: Duration = Duration::from_millis(250);

impl<B: ScanBroker, C: Clock> Engine<B, C> {
    /// Look up a task for an action, distinguishing "no such task" from
    /// "not yours to touch".
    fn authorize(
        &self,
        who: &Principal,
        task: &TaskId,
        permission: Permission,
    ) -> Result<Task, EngineError> {
        match self.store.find_task(task, who, permission)? {
            Some(task) => Ok(task),
            None => {
                // Visible to the owner but not to this caller, or absent.
                match self.store.has_permission(task, who, permission) {
                    Ok(_) => Err(ControllerError::PermissionDenied(permission).into()),
                    Err(_) => {
                        Err(ControllerError::not_found("task", task.as_str()).into())
                    }
                }
            }
        }
    }

    fn apply_action(&self, task: &TaskId, action: TaskAction) -> Result<TaskStatus, EngineError> {
        let current = self.store.task_status(task)?;
        match transition(current, action) {
            Transition::To(next) => {
                self.store.set_task_status(task, next)?;
                self.emit(Event::TaskStatusChanged {
                    task: task.clone(),
                    from: current,
                    to: next,
                });
                Ok(next)
            }
            Transition::NotApplicable => Err(ControllerError::invariant(format!(
                "transition ({current}, {action:?}) not applicable"
            ))
            .into()),
        }
    }

    /// Start a task: create its current report and hand it to the queue
    /// or directly to a worker.
    pub async fn start_task(
        &self,
        who: &Principal,
        task_id: &TaskId,
    ) -> Result<TaskStatus, EngineError> {
        let task = self.authorize(who, task_id, Permission::StartTask)?;
        if !can_start(task.status) {
            return Err(ControllerError::conflict(format!(
                "task is already active ({})",
                task.status
            ))
            .into());
        }

        let report = self.store.create_report(task_id, TaskStatus::Requested)?;
        let status = self.apply_action(task_id, TaskAction::Start)?;
        self.emit(Event::ReportCreated {
            task: task_id.clone(),
            report: report.clone(),
        });
        self.dispatch_requested(&task, report, StartMode::Start)?;
        Ok(status)
    }

    /// Resume a stopped or interrupted task, reusing its last report.
    pub async fn resume_task(
        &self,
        who: &Principal,
        task_id: &TaskId,
    ) -> Result<TaskStatus, EngineError> {
        let task = self.authorize(who, task_id, Permission::ResumeTask)?;
        if !can_resume(task.status) {
            return Err(ControllerError::conflict(format!(
                "only stopped or interrupted tasks can resume ({})",
                task.status
            ))
            .into());
        }
        let scanner = self.store.get_scanner(&task.scanner)?;
        if !scanner.kind.supports_resume() {
            return Err(ControllerError::ResumeNotSupported.into());
        }

        let report = self
            .store
            .last_resumable_report(task_id)?
            .ok_or_else(|| ControllerError::conflict("task has no resumable report"))?;
        self.store
            .reuse_report(task_id, &report, TaskStatus::Requested)?;
        self.store.trim_partial_report(&report)?;
        let status = self.apply_action(task_id, TaskAction::Resume)?;
        self.dispatch_requested(&task, report, StartMode::Resume)?;
        Ok(status)
    }

    /// Queue-mode scans wait for the scan queue; everything else gets a
    /// dedicated worker immediately.
    fn dispatch_requested(
        &self,
        task: &Task,
        report: sentra_core::ReportId,
        mode: StartMode,
    ) -> Result<(), EngineError> {
        let scanner = self.store.get_scanner(&task.scanner)?;
        let config = self.config();
        if config.scan_queue_enabled() && scanner.kind.supports_queueing() {
            self.store.scan_queue_add(&report)?;
            if self.running_scans() >= config.max_concurrent_scan_updates as usize {
                self.apply_action(&task.id, TaskAction::QueueFull)?;
            }
            return Ok(());
        }
        self.launch_worker(task.id.clone(), report, mode);
        Ok(())
    }

    /// Stop an active task. Running scans get a stop request their worker
    /// delivers; queued scans stop on the spot.
    pub async fn stop_task(
        &self,
        who: &Principal,
        task_id: &TaskId,
    ) -> Result<TaskStatus, EngineError> {
        let task = self.authorize(who, task_id, Permission::StopTask)?;
        if !can_stop(task.status) {
            return Err(ControllerError::conflict(format!(
                "task is not active ({})",
                task.status
            ))
            .into());
        }

        match task.status {
            TaskStatus::Requested | TaskStatus::Queued => {
                // Never ran: leave the queue and stop in place, atomically
                // with the membership change.
                if let Some(report) = &task.current_report {
                    self.store.scan_queue_remove(report)?;
                    self.store
                        .set_scan_times(report, None, Some(self.now_secs()))?;
                }
                self.apply_action(task_id, TaskAction::Stop)
            }
            _ => self.apply_action(task_id, TaskAction::Stop),
        }
    }

    /// Delete a task. Active tasks are torn down by their worker first;
    /// quiescent tasks are destroyed on the spot.
    pub async fn delete_task(
        &self,
        who: &Principal,
        task_id: &TaskId,
        ultimate: bool,
    ) -> Result<(), EngineError> {
        let task = self.authorize(who, task_id, Permission::DeleteTask)?;
        let action = if ultimate {
            TaskAction::DeleteUltimate
        } else {
            TaskAction::Delete
        };

        match task.status {
            TaskStatus::Running
            | TaskStatus::Processing
            | TaskStatus::StopRequested
            | TaskStatus::StopWaiting => {
                // The worker observes the request and stops the scan.
                self.apply_action(task_id, action)?;
                Ok(())
            }
            TaskStatus::Queued | TaskStatus::Requested => {
                if let Some(report) = &task.current_report {
                    self.store.scan_queue_remove(report)?;
                }
                self.store.delete_task(task_id)?;
                Ok(())
            }
            _ => {
                self.store.delete_task(task_id)?;
                Ok(())
            }
        }
    }

    /// Move a task to another scanner. Requires quiescence; with `force`,
    /// a running task is stopped first, moved, then resumed.
    pub async fn move_task(
        &self,
        who: &Principal,
        task_id: &TaskId,
        scanner: &ScannerId,
        force: bool,
    ) -> Result<(), EngineError> {
        let task = self.authorize(who, task_id, Permission::ModifyTask)?;
        // The destination must exist before anything is touched.
        self.store.get_scanner(scanner)?;

        if can_move(task.status) {
            self.store.set_task_scanner(task_id, scanner)?;
            return Ok(());
        }

        if !force || !can_stop(task.status) {
            return Err(ControllerError::conflict(format!(
                "task must be stopped, done or new to move ({})",
                task.status
            ))
            .into());
        }

        self.stop_task(who, task_id).await?;
        let deadline = self.clock.now() + MOVE_STOP_WAIT;
        loop {
            let status = self.store.task_status(task_id)?;
            if status == TaskStatus::Stopped {
                break;
            }
            if status == TaskStatus::Interrupted {
                // Good enough to move; the resume below restarts it.
                break;
            }
            if self.clock.now() >= deadline {
                return Err(ControllerError::conflict(
                    "timed out waiting for the scan to stop",
                )
                .into());
            }
            tokio::time::sleep(MOVE_STOP_POLL).await;
        }
        self.store.set_task_scanner(task_id, scanner)?;
        self.resume_task(who, task_id).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
