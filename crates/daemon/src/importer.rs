// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-processing importer for externally supplied reports.
//!
//! Uploaded reports arrive with their results already stored; the import
//! pass closes open report-hosts, records host identifiers and checks
//! the severity domain so the report is ready for rendering.

use async_trait::async_trait;
use sentra_core::{severity_to_level, ReportId};
use sentra_engine::{EngineError, ReportImporter};
use sentra_storage::TaskStore;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub struct PostProcessImporter;

fn epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[async_trait]
impl ReportImporter for PostProcessImporter {
    async fn import(
        &self,
        store: &Arc<dyn TaskStore>,
        report: &ReportId,
    ) -> Result<(), EngineError> {
        let now = epoch_secs();

        // Close any report-host still open and record identifiers.
        for host in store.report_hosts(report)? {
            if !host.is_finished() {
                store.end_report_host(report, &host.host, now)?;
            }
            store.add_host_detail(report, &host.host, "identifier", "ip", &host.host, Some("import"))?;
        }

        // Classify severities; out-of-domain values only warn, exactly as
        // during live ingestion.
        let mut results = 0usize;
        for result in store.results(report)? {
            let _ = severity_to_level(result.severity);
            results += 1;
        }

        // Ensure the scan end is recorded so the report counts as done.
        let stored = store.get_report(report)?;
        if stored.scan_end.is_none() {
            store.set_scan_times(report, None, Some(now))?;
        }

        tracing::info!(
            report = %report,
            hosts = store.report_host_count(report)?,
            results,
            max_severity = ?store.report_max_severity(report)?,
            "report import post-processing done"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "importer_tests.rs"]
mod tests;
