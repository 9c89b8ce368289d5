// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn bounded_semaphore_hands_out_cap_permits() {
    let sem = NamedSemaphore::new("SCAN_UPDATE", 2);
    let first = sem.try_acquire();
    let second = sem.try_acquire();
    assert!(first.is_acquired());
    assert!(second.is_acquired());
    assert!(matches!(sem.try_acquire(), AcquireOutcome::TimedOut));
    drop(first);
    assert!(sem.try_acquire().is_acquired());
}

#[tokio::test]
async fn permits_release_on_drop() {
    let sem = NamedSemaphore::new("REPORTS_PROCESSING", 1);
    {
        let _permit = sem.acquire().await;
        assert_eq!(sem.available(), 0);
    }
    // The holder is gone; capacity is back without an explicit release.
    assert_eq!(sem.available(), 1);
}

#[tokio::test]
async fn acquire_timeout_expires() {
    let sem = NamedSemaphore::new("SCAN_UPDATE", 1);
    let _held = sem.acquire().await;
    let outcome = sem
        .acquire_timeout(std::time::Duration::from_millis(30))
        .await;
    assert!(matches!(outcome, AcquireOutcome::TimedOut));
}

#[tokio::test]
async fn unbounded_never_blocks() {
    let sem = NamedSemaphore::new("SCAN_UPDATE", 0);
    assert!(!sem.is_bounded());
    for _ in 0..64 {
        assert!(matches!(sem.acquire().await, AcquireOutcome::Unbounded));
    }
}

#[tokio::test]
async fn wait_idle_returns_once_holders_finish() {
    let sem = NamedSemaphore::new("REPORTS_PROCESSING", 2);
    let permit = sem.acquire().await;
    let sem_clone = sem.clone();
    let waiter = tokio::spawn(async move { sem_clone.wait_idle().await });
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());
    drop(permit);
    waiter.await.unwrap();
}

#[test]
fn throttles_carry_their_caps() {
    let throttles = Throttles::new(4, 2);
    assert_eq!(throttles.scan_update.cap(), 4);
    assert_eq!(throttles.reports_processing.cap(), 2);
    assert_eq!(throttles.scan_update.name(), "SCAN_UPDATE");
    assert_eq!(throttles.reports_processing.name(), "REPORTS_PROCESSING");
}
