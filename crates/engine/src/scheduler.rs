// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The schedule tick: fire due tasks as their owners.
//!
//! Scheduled starts run through an authenticated self-connection, so the
//! usual permission checks apply to them exactly as to a client request.
//! Next-fire times are advanced before the action list is processed, so
//! a slow tick cannot double-fire a task.

use crate::error::EngineError;
use crate::runtime::Engine;
use async_trait::async_trait;
use sentra_adapters::ScanBroker;
use sentra_core::{Clock, Event, Principal, Schedule, TaskId, TaskStatus};
use sentra_storage::TaskScheduleRow;
use std::collections::HashSet;
use std::sync::Arc;

/// An authenticated session back into the controller.
#[async_trait]
pub trait AuthedSession: Send {
    async fn start_task(&mut self, task: &TaskId) -> Result<(), EngineError>;
    async fn stop_task(&mut self, task: &TaskId) -> Result<(), EngineError>;
}

/// Opens authenticated sessions as a given principal.
///
/// The daemon injects a loopback implementation; tests inject counters.
#[async_trait]
pub trait ClientConnector: Send + Sync + 'static {
    async fn connect(&self, owner: &Principal) -> Result<Box<dyn AuthedSession>, EngineError>;
}

/// One action the tick decided on.
#[derive(Debug, Clone)]
struct ScheduleAction {
    task: TaskId,
    owner: Principal,
    stop: bool,
    clear_after_run: bool,
    periods: i32,
}

/// What a tick did, for logging and tests.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScheduleTickSummary {
    pub reports_auto_deleted: usize,
    pub starts: usize,
    pub stops: usize,
    pub skipped_timed_out: usize,
    pub failures: usize,
}

impl<B: ScanBroker, C: Clock> Engine<B, C> {
    /// Run one schedule tick.
    pub async fn schedule_tick(
        &self,
        connector: Arc<dyn ClientConnector>,
    ) -> Result<ScheduleTickSummary, EngineError> {
        let config = self.config();
        let mut summary = ScheduleTickSummary::default();

        // 1. Auto-delete old reports when configured.
        if config.auto_delete_report_days > 0 {
            let cutoff = self.now_secs() - i64::from(config.auto_delete_report_days) * 86_400;
            summary.reports_auto_deleted = self.store.delete_reports_older_than(cutoff)?;
        }

        // 2. Refresh the VT cache.
        self.refresh_vt_cache().await;

        // 3. Walk the scheduled tasks inside one read snapshot.
        let mut rows: Vec<TaskScheduleRow> = Vec::new();
        self.store.with_task_schedules(&mut |row| rows.push(row.clone()))?;

        let now = self.now_secs();
        let now_utc = self.clock.now_utc();
        let mut seen: HashSet<TaskId> = HashSet::new();
        let mut actions: Vec<ScheduleAction> = Vec::new();

        for row in rows {
            // One action per task per tick, however many grants the
            // underlying join produced.
            if !seen.insert(row.task.clone()) {
                continue;
            }

            let schedule = Schedule::new(
                row.schedule.clone(),
                "",
                row.owner.user.clone(),
                row.icalendar.clone(),
                row.timezone.clone(),
            );

            let Some(due) = row.next_time else {
                // Freshly scheduled: seed the fire time, nothing due yet.
                let first = schedule.next_fire_after(now_utc);
                self.store
                    .set_task_next_time(&row.task, first.map(|t| t.timestamp()))?;
                continue;
            };

            if due <= now {
                // Advance the fire time before anything can fail, so the
                // task cannot fire twice off one slow tick.
                let upcoming = schedule.next_fire_after(now_utc);
                self.store
                    .set_task_next_time(&row.task, upcoming.map(|t| t.timestamp()))?;

                if config.schedule_timeout_enabled()
                    && now - due > config.schedule_timeout * 60
                {
                    tracing::warn!(task = %row.task, overdue_secs = now - due, "scheduled start timed out, skipping");
                    summary.skipped_timed_out += 1;
                    continue;
                }

                actions.push(ScheduleAction {
                    task: row.task.clone(),
                    owner: row.owner.clone(),
                    stop: false,
                    clear_after_run: schedule.is_once_off() && row.duration_secs == 0,
                    periods: row.periods,
                });
            } else if row.duration_secs > 0 {
                // A started run whose duration elapsed is due to stop.
                if self.stop_due(&row, now)? {
                    actions.push(ScheduleAction {
                        task: row.task.clone(),
                        owner: row.owner.clone(),
                        stop: true,
                        clear_after_run: false,
                        periods: row.periods,
                    });
                }
            }
        }

        // 4. The iteration is closed; process the actions.
        let mut joins = Vec::new();
        for action in actions {
            let connector = Arc::clone(&connector);
            let act = action.clone();
            // The action runs detached from the tick's own state, as the
            // schedule owner.
            joins.push((
                action,
                tokio::spawn(async move {
                    let mut session = connector.connect(&act.owner).await?;
                    if act.stop {
                        session.stop_task(&act.task).await
                    } else {
                        session.start_task(&act.task).await
                    }
                }),
            ));
        }

        for (action, join) in joins {
            let outcome = match join.await {
                Ok(outcome) => outcome,
                Err(e) => Err(sentra_core::ControllerError::invariant(format!(
                    "schedule action panicked: {e}"
                ))
                .into()),
            };
            match outcome {
                Ok(()) => {
                    self.emit(Event::ScheduleFired {
                        task: action.task.clone(),
                        stop: action.stop,
                    });
                    if action.stop {
                        summary.stops += 1;
                    } else {
                        summary.starts += 1;
                        self.after_successful_start(&action)?;
                    }
                }
                Err(e) => {
                    // Never retried within the tick; the already-advanced
                    // fire time is the reschedule.
                    tracing::warn!(task = %action.task, error = %e, "schedule action failed, rescheduled");
                    summary.failures += 1;
                }
            }
        }

        Ok(summary)
    }

    /// Post-start schedule bookkeeping: spend once-off schedules and
    /// bounded period counters.
    fn after_successful_start(&self, action: &ScheduleAction) -> Result<(), EngineError> {
        if action.clear_after_run {
            self.store.clear_task_schedule(&action.task)?;
            return Ok(());
        }
        if action.periods > 0 {
            let remaining = action.periods - 1;
            if remaining == 0 {
                self.store.clear_task_schedule(&action.task)?;
            } else {
                self.store
                    .set_task_schedule_periods(&action.task, remaining)?;
            }
        }
        Ok(())
    }

    /// Whether a duration-bounded run has exceeded its allowance.
    fn stop_due(&self, row: &TaskScheduleRow, now: i64) -> Result<bool, EngineError> {
        let task = match self.store.get_task(&row.task) {
            Ok(task) => task,
            Err(_) => return Ok(false),
        };
        if !matches!(task.status, TaskStatus::Running | TaskStatus::Processing) {
            return Ok(false);
        }
        let Some(report) = &task.current_report else {
            return Ok(false);
        };
        let report = self.store.get_report(report)?;
        Ok(report
            .scan_start
            .is_some_and(|start| start + row.duration_secs as i64 <= now))
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
