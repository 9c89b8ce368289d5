// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP scanner dispatch.

use super::{ScanControl, ScanOutcome, ScanRun};
use crate::error::EngineError;
use sentra_adapters::{HttpScanApi, HttpScanPhase, ScanBroker};
use sentra_core::{
    Clock, ControllerError, CredentialKind, Scanner, StartMode, TaskAction,
};
use serde_json::json;
use std::sync::Arc;

pub async fn run<B: ScanBroker, C: Clock>(
    run: &ScanRun<B, C>,
    scanner: &Scanner,
) -> Result<ScanOutcome, EngineError> {
    let session = run
        .broker
        .open_http_scanner(scanner, Some(run.report.as_str()))
        .await?;
    let config = build_scan_config(run)?;

    let scan_id = session.create_scan(config).await?;
    session.start_scan(&scan_id).await?;
    run.apply(TaskAction::Admit)?;
    run.store
        .set_scan_times(&run.report, Some(run.now_secs()), None)?;
    tracing::info!(task = %run.task.id, scan_id, "scan started");

    poll(run, session, &scan_id).await
}

/// Shared poll loop for the HTTP-shaped scanners (also used by the agent
/// controller, whose results have the same shape).
pub(super) async fn poll<B: ScanBroker, C: Clock, S>(
    run: &ScanRun<B, C>,
    session: Arc<S>,
    scan_id: &str,
) -> Result<ScanOutcome, EngineError>
where
    S: HttpShaped + ?Sized,
{
    let poll_interval = run.config.scan_poll_interval();
    let mut offset = 0usize;
    loop {
        match run.control()? {
            ScanControl::StopScan => {
                session.stop(scan_id).await?;
                run.apply(TaskAction::ScannerAck)?;
            }
            ScanControl::Delete => {
                session.stop(scan_id).await?;
                session.delete(scan_id).await?;
                run.apply(TaskAction::DeleteObserved)?;
                return Ok(ScanOutcome::Deleted);
            }
            ScanControl::Abandon => {
                session.stop(scan_id).await?;
                session.delete(scan_id).await?;
                return Ok(ScanOutcome::Stopped);
            }
            ScanControl::Continue | ScanControl::AwaitingStop => {}
        }

        let status = session.status(scan_id).await?;
        let results = session.results(scan_id, offset).await?;
        offset += results.len();
        ensure_hosts_started(run, &results)?;
        run.ingest(results)?;
        run.store.set_report_progress(&run.report, status.progress)?;

        match status.status {
            HttpScanPhase::Stored | HttpScanPhase::Requested | HttpScanPhase::Running => {}
            HttpScanPhase::Stopped => {
                let end = status.end_time.unwrap_or_else(|| run.now_secs());
                run.store.set_scan_times(&run.report, None, Some(end))?;
                run.apply(TaskAction::ScannerDone)?;
                return Ok(ScanOutcome::Stopped);
            }
            HttpScanPhase::Succeeded => {
                run.apply(TaskAction::ScanComplete)?;
                run.finalize_report()?;
                session.delete(scan_id).await?;
                let end = status.end_time.unwrap_or_else(|| run.now_secs());
                run.store.set_scan_times(&run.report, None, Some(end))?;
                run.apply(TaskAction::PostDone)?;
                return Ok(ScanOutcome::Completed);
            }
            HttpScanPhase::Failed => {
                run.interrupt("Scanner reported the scan failed.")?;
                return Ok(ScanOutcome::Interrupted);
            }
        }

        tokio::time::sleep(poll_interval).await;
    }
}

fn ensure_hosts_started<B: ScanBroker, C: Clock>(
    run: &ScanRun<B, C>,
    results: &[sentra_adapters::RawScanResult],
) -> Result<(), EngineError> {
    let known: Vec<String> = run
        .store
        .report_hosts(&run.report)?
        .into_iter()
        .map(|h| h.host)
        .collect();
    for result in results {
        if !result.host.is_empty() && !known.contains(&result.host) {
            run.store
                .start_report_host(&run.report, &result.host, run.now_secs())?;
        }
    }
    Ok(())
}

/// Build the scan-config JSON from scanner preferences, VT selection and
/// the target with its credentials.
pub(super) fn build_scan_config<B: ScanBroker, C: Clock>(
    run: &ScanRun<B, C>,
) -> Result<serde_json::Value, EngineError> {
    let target_id = run
        .task
        .target
        .as_ref()
        .ok_or_else(|| ControllerError::conflict("task has no target"))?;
    let target = run.store.get_target(target_id)?;

    let config_id = run
        .task
        .config
        .as_ref()
        .ok_or_else(|| ControllerError::conflict("task has no scan config"))?;
    let config = run.store.get_scan_config(config_id)?;
    if config.vts.is_empty() {
        return Err(ControllerError::conflict(
            "scan config selects no VTs: feed not synced yet",
        )
        .into());
    }

    let mut vts = Vec::new();
    let mut all_discovery = true;
    for selection in &config.vts {
        let mut parameters = serde_json::Map::new();
        for (key, value) in &selection.preferences {
            parameters.insert(key.clone(), json!(value));
        }
        if let Some(timeout) = selection.timeout {
            // Per-VT timeouts ride as a per-script preference.
            parameters.insert("timeout".to_string(), json!(timeout.to_string()));
        }
        vts.push(json!({ "oid": selection.oid, "parameters": parameters }));

        let discovery = run
            .store
            .vt_meta(&selection.oid)?
            .map(|meta| meta.is_discovery())
            .unwrap_or(false);
        all_discovery = all_discovery && discovery;
    }

    let mut excluded: Vec<String> = target
        .exclude_hosts
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if run.mode == StartMode::Resume {
        // The reused report's finished hosts are excluded from the rerun.
        for host in run.store.finished_hosts(&run.report)? {
            if !excluded.contains(&host) {
                excluded.push(host);
            }
        }
    }

    let mut credentials = Vec::new();
    for (protocol, credential_id) in &target.credentials {
        let credential = run.store.get_credential(credential_id)?;
        credentials.push(credential_json(protocol.name(), &credential));
    }

    let hosts: Vec<String> = target
        .hosts
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    Ok(json!({
        "target": {
            "hosts": hosts,
            "excluded_hosts": excluded,
            "ports": target.port_range,
            "alive_test_methods": target.alive_tests.0,
            "reverse_lookup_only": target.reverse_lookup_only,
            "reverse_lookup_unify": target.reverse_lookup_unify,
            "credentials": credentials,
        },
        "vts": vts,
        "scanner_preferences": config.preferences,
        "discovery": all_discovery,
    }))
}

fn credential_json(service: &str, credential: &sentra_core::Credential) -> serde_json::Value {
    match &credential.kind {
        CredentialKind::UsernamePassword { username, password } => json!({
            "service": service,
            "kind": "up",
            "username": username,
            "password": password.expose(),
        }),
        CredentialKind::UsernameSshKey {
            username,
            private_key,
            passphrase,
        } => json!({
            "service": service,
            "kind": "usk",
            "username": username,
            "private_key": private_key.expose(),
            "passphrase": passphrase.as_ref().map(|p| p.expose()),
        }),
        CredentialKind::SnmpV1 { community } => json!({
            "service": service,
            "kind": "snmp",
            "community": community.expose(),
        }),
        CredentialKind::SnmpV3 {
            username,
            password,
            auth_algorithm,
            privacy_password,
            privacy_algorithm,
        } => json!({
            "service": service,
            "kind": "snmp",
            "username": username,
            "password": password.expose(),
            "auth_algorithm": auth_algorithm,
            "privacy_password": privacy_password.expose(),
            "privacy_algorithm": privacy_algorithm,
        }),
        CredentialKind::Krb5 {
            username,
            password,
            realm,
            kdc,
        } => json!({
            "service": service,
            "kind": "krb5",
            "username": username,
            "password": password.expose(),
            "realm": realm,
            "kdc": kdc,
        }),
        CredentialKind::StoreReference { reference } => json!({
            "service": service,
            "kind": "cc",
            "reference": reference,
        }),
    }
}

/// The subset of the HTTP surface the poll loop needs, so the agent
/// controller can share it.
#[async_trait::async_trait]
pub(super) trait HttpShaped: Send + Sync {
    async fn status(
        &self,
        scan_id: &str,
    ) -> Result<sentra_adapters::HttpScanStatus, sentra_adapters::AdapterError>;
    async fn results(
        &self,
        scan_id: &str,
        offset: usize,
    ) -> Result<Vec<sentra_adapters::RawScanResult>, sentra_adapters::AdapterError>;
    async fn stop(&self, scan_id: &str) -> Result<(), sentra_adapters::AdapterError>;
    async fn delete(&self, scan_id: &str) -> Result<(), sentra_adapters::AdapterError>;
}

#[async_trait::async_trait]
impl HttpShaped for dyn HttpScanApi {
    async fn status(
        &self,
        scan_id: &str,
    ) -> Result<sentra_adapters::HttpScanStatus, sentra_adapters::AdapterError> {
        self.scan_status(scan_id).await
    }
    async fn results(
        &self,
        scan_id: &str,
        offset: usize,
    ) -> Result<Vec<sentra_adapters::RawScanResult>, sentra_adapters::AdapterError> {
        self.scan_results(scan_id, offset).await
    }
    async fn stop(&self, scan_id: &str) -> Result<(), sentra_adapters::AdapterError> {
        self.stop_scan(scan_id).await
    }
    async fn delete(&self, scan_id: &str) -> Result<(), sentra_adapters::AdapterError> {
        self.delete_scan(scan_id).await
    }
}

#[async_trait::async_trait]
impl HttpShaped for dyn sentra_adapters::AgentControllerApi {
    async fn status(
        &self,
        scan_id: &str,
    ) -> Result<sentra_adapters::HttpScanStatus, sentra_adapters::AdapterError> {
        self.scan_status(scan_id).await
    }
    async fn results(
        &self,
        scan_id: &str,
        offset: usize,
    ) -> Result<Vec<sentra_adapters::RawScanResult>, sentra_adapters::AdapterError> {
        self.scan_results(scan_id, offset).await
    }
    async fn stop(&self, scan_id: &str) -> Result<(), sentra_adapters::AdapterError> {
        self.stop_scan(scan_id).await
    }
    async fn delete(&self, scan_id: &str) -> Result<(), sentra_adapters::AdapterError> {
        self.delete_scan(scan_id).await
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
