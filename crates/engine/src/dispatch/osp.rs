// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OSP scanner dispatch.

use super::{ScanControl, ScanOutcome, ScanRun};
use crate::error::EngineError;
use sentra_adapters::osp::{OspCredential, OspScanSpec, OspTargetSpec, OspVt};
use sentra_adapters::{OspStatus, ScanBroker};
use sentra_core::{
    Clock, ControllerError, Credential, CredentialKind, CredentialProtocol, Scanner, StartMode,
    TaskAction,
};
use std::collections::BTreeMap;

pub async fn run<B: ScanBroker, C: Clock>(
    run: &ScanRun<B, C>,
    scanner: &Scanner,
) -> Result<ScanOutcome, EngineError> {
    let session = run.broker.open_osp(scanner).await?;
    let spec = build_spec(run)?;

    let scan_id = session.start_scan(&spec).await?;
    run.apply(TaskAction::Admit)?;
    run.store
        .set_scan_times(&run.report, Some(run.now_secs()), None)?;
    tracing::info!(task = %run.task.id, scan_id, "scan started");

    let poll_interval = run.config.scan_poll_interval();
    loop {
        match run.control()? {
            ScanControl::StopScan => {
                session.stop_scan(&scan_id).await?;
                run.apply(TaskAction::ScannerAck)?;
            }
            ScanControl::Delete => {
                session.stop_scan(&scan_id).await?;
                session.delete_scan(&scan_id).await?;
                run.apply(TaskAction::DeleteObserved)?;
                return Ok(ScanOutcome::Deleted);
            }
            ScanControl::Abandon => {
                session.stop_scan(&scan_id).await?;
                session.delete_scan(&scan_id).await?;
                return Ok(ScanOutcome::Stopped);
            }
            ScanControl::Continue | ScanControl::AwaitingStop => {}
        }

        let status = session.get_scan(&scan_id).await?;
        ensure_hosts_started(run, &status.results)?;
        run.ingest(status.results.clone())?;
        run.store.set_report_progress(&run.report, status.progress)?;
        run.emit(sentra_core::Event::ScanProgress {
            report: run.report.clone(),
            progress: status.progress,
        });

        match status.status {
            OspStatus::Queued | OspStatus::Init | OspStatus::Running => {}
            OspStatus::Stopped => {
                let end = status.end_time.unwrap_or_else(|| run.now_secs());
                run.store.set_scan_times(&run.report, None, Some(end))?;
                run.apply(TaskAction::ScannerDone)?;
                return Ok(ScanOutcome::Stopped);
            }
            OspStatus::Finished => {
                run.apply(TaskAction::ScanComplete)?;
                run.finalize_report()?;
                session.delete_scan(&scan_id).await?;
                let end = status.end_time.unwrap_or_else(|| run.now_secs());
                run.store.set_scan_times(&run.report, None, Some(end))?;
                run.apply(TaskAction::PostDone)?;
                return Ok(ScanOutcome::Completed);
            }
            OspStatus::Interrupted => {
                run.interrupt("Scanner interrupted the scan.")?;
                return Ok(ScanOutcome::Interrupted);
            }
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Record a report-host for every host that produced a result.
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

/// Assemble the scan specification: target, credentials, VT selection and
/// scanner preferences.
fn build_spec<B: ScanBroker, C: Clock>(
    run: &ScanRun<B, C>,
) -> Result<OspScanSpec, EngineError> {
    let target_id = run
        .task
        .target
        .as_ref()
        .ok_or_else(|| ControllerError::conflict("task has no target"))?;
    let target = run.store.get_target(target_id)?;

    let mut exclude = target.exclude_hosts.clone();
    if run.mode == StartMode::Resume {
        // Hosts already finished in the reused report are not rescanned.
        for host in run.store.finished_hosts(&run.report)? {
            if !exclude.is_empty() {
                exclude.push(',');
            }
            exclude.push_str(&host);
        }
    }

    let mut credentials = Vec::new();
    for (protocol, credential_id) in &target.credentials {
        let credential = run.store.get_credential(credential_id)?;
        credentials.push(convert_credential(*protocol, &credential));
    }

    let mut vts = Vec::new();
    if let Some(config_id) = &run.task.config {
        let config = run.store.get_scan_config(config_id)?;
        for selection in &config.vts {
            let mut values: BTreeMap<String, String> = selection.preferences.clone().into_iter().collect();
            if let Some(timeout) = selection.timeout {
                values.insert("timeout".to_string(), timeout.to_string());
            }
            vts.push(OspVt {
                oid: selection.oid.clone(),
                values,
            });
        }
    }

    let mut scanner_params: BTreeMap<String, String> = BTreeMap::new();
    if let Some(config_id) = &run.task.config {
        let config = run.store.get_scan_config(config_id)?;
        scanner_params.extend(config.preferences.clone());
    }
    // User-scoped host restrictions ride along as scanner preferences.
    for key in ["hosts_allow", "hosts_deny"] {
        if let Some(value) = run.task.preferences.get(key) {
            scanner_params.insert(key.to_string(), value.clone());
        }
    }

    Ok(OspScanSpec {
        scan_id: run.report.to_string(),
        target: OspTargetSpec {
            hosts: target.hosts.clone(),
            exclude_hosts: exclude,
            ports: target.port_range.clone(),
            alive_tests: target.alive_tests.0,
            reverse_lookup_only: target.reverse_lookup_only,
            reverse_lookup_unify: target.reverse_lookup_unify,
            credentials,
        },
        vts,
        scanner_params,
    })
}

/// Render a stored credential for the scanner, decrypted just-in-time.
/// The per-scan copies live inside the spec and drop (zeroised) with it.
fn convert_credential(protocol: CredentialProtocol, credential: &Credential) -> OspCredential {
    let service = protocol.name().to_string();
    let port = match protocol {
        CredentialProtocol::Ssh => Some(22),
        _ => None,
    };
    let (kind, fields) = match &credential.kind {
        CredentialKind::UsernamePassword { username, password } => (
            "up",
            vec![
                ("username".to_string(), username.clone()),
                ("password".to_string(), password.expose().to_string()),
            ],
        ),
        CredentialKind::UsernameSshKey {
            username,
            private_key,
            passphrase,
        } => {
            let mut fields = vec![
                ("username".to_string(), username.clone()),
                ("private".to_string(), private_key.expose().to_string()),
            ];
            if let Some(phrase) = passphrase {
                fields.push(("passphrase".to_string(), phrase.expose().to_string()));
            }
            ("usk", fields)
        }
        CredentialKind::SnmpV1 { community } => (
            "snmp",
            vec![("community".to_string(), community.expose().to_string())],
        ),
        CredentialKind::SnmpV3 {
            username,
            password,
            auth_algorithm,
            privacy_password,
            privacy_algorithm,
        } => (
            "snmp",
            vec![
                ("username".to_string(), username.clone()),
                ("password".to_string(), password.expose().to_string()),
                ("auth_algorithm".to_string(), auth_algorithm.clone()),
                ("privacy_password".to_string(), privacy_password.expose().to_string()),
                ("privacy_algorithm".to_string(), privacy_algorithm.clone()),
            ],
        ),
        CredentialKind::Krb5 {
            username,
            password,
            realm,
            kdc,
        } => (
            "krb5",
            vec![
                ("username".to_string(), username.clone()),
                ("password".to_string(), password.expose().to_string()),
                ("realm".to_string(), realm.clone()),
                ("kdc".to_string(), kdc.clone()),
            ],
        ),
        CredentialKind::StoreReference { reference } => {
            ("cc", vec![("reference".to_string(), reference.clone())])
        }
    };
    OspCredential {
        kind: kind.to_string(),
        service,
        port,
        fields,
    }
}

#[cfg(test)]
#[path = "osp_tests.rs"]
mod tests;
