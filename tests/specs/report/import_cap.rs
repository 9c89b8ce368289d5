//! Scenario: the report-processing cap bounds concurrent importers.

use crate::prelude::*;
use async_trait::async_trait;
use sentra_core::{ReportId, ScannerKind, TaskStatus};
use sentra_engine::{EngineError, ReportImporter};
use sentra_storage::TaskStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct GaugedImporter {
    current: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

#[async_trait]
impl ReportImporter for GaugedImporter {
    async fn import(
        &self,
        _store: &Arc<dyn TaskStore>,
        _report: &ReportId,
    ) -> Result<(), EngineError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(80)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn three_waiting_reports_two_at_a_time() {
    let mut cfg = config();
    cfg.max_concurrent_report_processing = 2;
    let h = harness_with(cfg);
    let task = h.seed_task("import-task", ScannerKind::Osp);
    let mut reports = Vec::new();
    for _ in 0..3 {
        let report = h
            .store
            .create_report(&task, TaskStatus::Requested)
            .unwrap();
        h.store.queue_report_import(&report).unwrap();
        reports.push(report);
    }

    let dir = tempfile::tempdir().unwrap();
    let importer = Arc::new(GaugedImporter {
        current: AtomicUsize::new(0),
        peak: AtomicUsize::new(0),
        total: AtomicUsize::new(0),
    });

    let done = h
        .engine
        .process_report_imports(importer.clone(), dir.path())
        .await
        .unwrap();

    // All three imported; at most two ran concurrently; the third waited.
    assert_eq!(done, 3);
    assert_eq!(importer.total.load(Ordering::SeqCst), 3);
    assert!(importer.peak.load(Ordering::SeqCst) <= 2);
    assert!(h.store.reports_awaiting_processing(10).unwrap().is_empty());
    // All three reports still exist in the store.
    for report in &reports {
        assert!(h.store.get_report(report).is_ok());
    }
}
