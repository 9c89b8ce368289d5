// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The built-in CVE correlation scanner.
//!
//! No scanner process is involved: each target host's most recent
//! report-host supplies the installed products (CPE host details), which
//! are correlated against the SCAP data. With match trees present
//! (matching-version 1) the AND/OR trees decide applicability; otherwise
//! the legacy affected-products rows do.

use super::{ScanOutcome, ScanRun};
use crate::error::EngineError;
use sentra_adapters::ScanBroker;
use sentra_core::{Clock, ControllerError, TaskAction};
use sentra_storage::CveEntry;
use std::collections::HashSet;

/// QoD recorded for correlation results: registry-level detection.
const CVE_SCAN_QOD: i32 = 75;

pub async fn run<B: ScanBroker, C: Clock>(
    run: &ScanRun<B, C>,
) -> Result<ScanOutcome, EngineError> {
    let target_id = run
        .task
        .target
        .as_ref()
        .ok_or_else(|| ControllerError::conflict("task has no target"))?;
    let target = run.store.get_target(target_id)?;

    run.apply(TaskAction::Admit)?;
    run.store
        .set_scan_times(&run.report, Some(run.now_secs()), None)?;

    let use_match_nodes = run.store.scap_matching_version()? >= 1;

    for host in target.expand_hosts() {
        run.store
            .start_report_host(&run.report, &host, run.now_secs())?;
        scan_host(run, &host, use_match_nodes)?;
        run.store
            .end_report_host(&run.report, &host, run.now_secs())?;
    }

    run.apply(TaskAction::ScanComplete)?;
    run.finalize_report()?;
    run.store
        .set_scan_times(&run.report, None, Some(run.now_secs()))?;
    run.apply(TaskAction::PostDone)?;
    Ok(ScanOutcome::Completed)
}

/// Correlate one host's known products against the CVE data.
fn scan_host<B: ScanBroker, C: Clock>(
    run: &ScanRun<B, C>,
    host: &str,
    use_match_nodes: bool,
) -> Result<(), EngineError> {
    let Some((source_report, details)) = run.store.last_report_host(host)? else {
        tracing::debug!(host, "no previous report for host, skipping");
        return Ok(());
    };

    let host_cpes: Vec<String> = details
        .iter()
        .filter(|d| d.kind == "App")
        .map(|d| d.value.clone())
        .collect();

    let mut emitted: HashSet<String> = HashSet::new();
    for cpe in &host_cpes {
        if use_match_nodes {
            for (entry, node) in run.store.cves_with_match_nodes(cpe)? {
                if node.matches(&host_cpes) && emitted.insert(entry.cve.clone()) {
                    emit_result(run, host, cpe, &entry)?;
                }
            }
        } else {
            for entry in run.store.cves_for_affected_product(cpe)? {
                if emitted.insert(entry.cve.clone()) {
                    emit_result(run, host, cpe, &entry)?;
                }
            }
        }
    }

    tracing::debug!(
        host,
        source_report = %source_report,
        products = host_cpes.len(),
        findings = emitted.len(),
        "host correlation done"
    );
    Ok(())
}

fn emit_result<B: ScanBroker, C: Clock>(
    run: &ScanRun<B, C>,
    host: &str,
    cpe: &str,
    entry: &CveEntry,
) -> Result<(), EngineError> {
    let description = format!(
        "The host carries the product: {}\nIt is potentially vulnerable to: {}.\n\n{}",
        cpe, entry.cve, entry.description
    );
    run.ingest(vec![sentra_adapters::RawScanResult {
        host: host.to_string(),
        port: "general/tcp".to_string(),
        oid: entry.cve.clone(),
        severity: entry.severity,
        qod: CVE_SCAN_QOD,
        description,
    }])?;
    Ok(())
}

#[cfg(test)]
#[path = "cve_tests.rs"]
mod tests;
