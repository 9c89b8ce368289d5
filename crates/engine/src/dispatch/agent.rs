// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-controller dispatch.
//!
//! The scan fans out to deployed agents instead of a host target; result
//! polling is shared with the HTTP scanner. Resuming is not supported by
//! the controller, which `run_scan` enforces before dispatch.

use super::{ScanOutcome, ScanRun};
use crate::error::EngineError;
use sentra_adapters::ScanBroker;
use sentra_core::{Clock, ControllerError, Scanner, TaskAction};
use serde_json::json;

pub async fn run<B: ScanBroker, C: Clock>(
    run: &ScanRun<B, C>,
    scanner: &Scanner,
) -> Result<ScanOutcome, EngineError> {
    let group_id = run
        .task
        .agent_group
        .as_ref()
        .ok_or_else(|| ControllerError::conflict("task has no agent group"))?;
    let group = run.store.get_agent_group(group_id)?;
    if group.agents.is_empty() {
        return Err(ControllerError::conflict("agent group is empty").into());
    }

    let session = run.broker.open_agent_controller(scanner).await?;

    let config = build_agent_config(run)?;
    let scan_id = session.create_scan(&group.agents, config).await?;
    session.start_scan(&scan_id).await?;
    run.apply(TaskAction::Admit)?;
    run.store
        .set_scan_times(&run.report, Some(run.now_secs()), None)?;
    tracing::info!(task = %run.task.id, scan_id, agents = group.agents.len(), "agent scan started");

    super::http::poll(run, session, &scan_id).await
}

/// The agent-side scan configuration: the VT selection and scanner
/// preferences; host targeting is replaced by the agent list.
fn build_agent_config<B: ScanBroker, C: Clock>(
    run: &ScanRun<B, C>,
) -> Result<serde_json::Value, EngineError> {
    let mut vts = Vec::new();
    let mut preferences = serde_json::Map::new();
    if let Some(config_id) = &run.task.config {
        let config = run.store.get_scan_config(config_id)?;
        for selection in &config.vts {
            vts.push(json!({ "oid": selection.oid }));
        }
        for (key, value) in &config.preferences {
            preferences.insert(key.clone(), json!(value));
        }
    }
    Ok(json!({ "vts": vts, "scanner_preferences": preferences }))
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
