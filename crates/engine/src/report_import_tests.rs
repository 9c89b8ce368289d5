// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{bed, bed_with_config, test_config};
use sentra_core::ScannerKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Importer that tracks how many imports run at once.
struct TrackingImporter {
    current: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
    delay: Duration,
    fail: bool,
}

impl TrackingImporter {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            delay,
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
            delay: Duration::ZERO,
            fail: true,
        })
    }
}

#[async_trait]
impl ReportImporter for TrackingImporter {
    async fn import(
        &self,
        _store: &Arc<dyn TaskStore>,
        _report: &ReportId,
    ) -> Result<(), crate::EngineError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(sentra_core::ControllerError::conflict("parse error").into())
        } else {
            Ok(())
        }
    }
}

fn pending_reports(bed: &crate::test_helpers::TestBed, n: usize) -> Vec<ReportId> {
    let task = bed.seed_task("t1", ScannerKind::Osp);
    let mut reports = Vec::new();
    for _ in 0..n {
        let report = bed
            .store
            .create_report(&task, sentra_core::TaskStatus::Requested)
            .unwrap();
        bed.store.queue_report_import(&report).unwrap();
        reports.push(report);
    }
    reports
}

#[tokio::test]
async fn successful_imports_drain_the_queue() {
    let bed = bed();
    let reports = pending_reports(&bed, 2);
    let dir = tempfile::tempdir().unwrap();
    let importer = TrackingImporter::new(Duration::ZERO);

    let done = bed
        .engine
        .process_report_imports(importer.clone(), dir.path())
        .await
        .unwrap();
    assert_eq!(done, 2);
    assert!(bed.store.reports_awaiting_processing(10).unwrap().is_empty());
    assert_eq!(importer.total.load(Ordering::SeqCst), 2);
    let _ = reports;
}

#[tokio::test]
async fn concurrency_is_bounded_by_the_processing_cap() {
    let mut config = test_config();
    config.max_concurrent_report_processing = 2;
    let bed = bed_with_config(config);
    pending_reports(&bed, 3);
    let dir = tempfile::tempdir().unwrap();
    let importer = TrackingImporter::new(Duration::from_millis(80));

    let done = bed
        .engine
        .process_report_imports(importer.clone(), dir.path())
        .await
        .unwrap();

    // All three processed, never more than two at once.
    assert_eq!(done, 3);
    assert!(importer.peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(importer.total.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn held_lock_skips_the_report() {
    let bed = bed();
    let reports = pending_reports(&bed, 1);
    let dir = tempfile::tempdir().unwrap();

    // Another process is importing this report.
    let lock = crate::file_lock::FileLock::acquire(&report_lock_path(dir.path(), &reports[0]))
        .unwrap();

    let importer = TrackingImporter::new(Duration::ZERO);
    let done = bed
        .engine
        .process_report_imports(importer.clone(), dir.path())
        .await
        .unwrap();
    assert_eq!(done, 0);
    assert_eq!(importer.total.load(Ordering::SeqCst), 0);
    // Still pending for the next tick.
    assert_eq!(bed.store.reports_awaiting_processing(10).unwrap().len(), 1);
    lock.release().unwrap();
}

#[tokio::test]
async fn concurrent_ticks_do_not_double_import() {
    let bed_a = bed();
    let reports = pending_reports(&bed_a, 1);
    let dir = tempfile::tempdir().unwrap();
    let importer = TrackingImporter::new(Duration::from_millis(100));

    // Two ticks race on the same report and lock directory.
    let (a, b) = tokio::join!(
        bed_a
            .engine
            .process_report_imports(importer.clone(), dir.path()),
        bed_a
            .engine
            .process_report_imports(importer.clone(), dir.path()),
    );
    let total = a.unwrap() + b.unwrap();
    // The critical section ran exactly once.
    assert_eq!(total, 1);
    assert_eq!(importer.total.load(Ordering::SeqCst), 1);
    assert_eq!(importer.peak.load(Ordering::SeqCst), 1);
    let _ = reports;
}

#[tokio::test]
async fn failed_import_interrupts_the_report() {
    let bed = bed();
    let reports = pending_reports(&bed, 1);
    let dir = tempfile::tempdir().unwrap();
    let importer = TrackingImporter::failing();

    let done = bed
        .engine
        .process_report_imports(importer, dir.path())
        .await
        .unwrap();
    assert_eq!(done, 0);

    let report = bed.store.get_report(&reports[0]).unwrap();
    assert_eq!(report.run_status, sentra_core::TaskStatus::Interrupted);
    // The user sees why the import ended.
    let results = bed.store.results(&reports[0]).unwrap();
    assert!(results
        .iter()
        .any(|r| r.description.contains("Report import failed")));
    // Out of the queue, and the lock is free again.
    assert!(bed.store.reports_awaiting_processing(10).unwrap().is_empty());
    assert!(
        crate::file_lock::FileLock::try_acquire(&report_lock_path(dir.path(), &reports[0]))
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn tick_limit_bounds_the_batch() {
    let mut config = test_config();
    config.report_import_tick_limit = 2;
    let bed = bed_with_config(config);
    pending_reports(&bed, 5);
    let dir = tempfile::tempdir().unwrap();
    let importer = TrackingImporter::new(Duration::ZERO);

    let done = bed
        .engine
        .process_report_imports(importer.clone(), dir.path())
        .await
        .unwrap();
    assert_eq!(done, 2);
    assert_eq!(bed.store.reports_awaiting_processing(10).unwrap().len(), 3);
}
