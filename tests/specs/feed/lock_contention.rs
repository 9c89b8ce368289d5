//! Scenario: feed lock contention between two sync passes.

use async_trait::async_trait;
use sentra_core::ControllerConfig;
use sentra_engine::{
    manage_sync, DataObjectKind, FeedKind, FeedStatusProbe, FeedSyncDeps, FeedSyncers, FileLock,
    MemoryProbe, SyncOutcome,
};
use std::sync::Arc;
use std::time::Duration;

struct AlwaysStale;

impl FeedStatusProbe for AlwaysStale {
    fn needs_update(&self, _kind: FeedKind) -> bool {
        true
    }
    fn data_drift(&self) -> Vec<DataObjectKind> {
        Vec::new()
    }
}

struct SlowSyncers;

#[async_trait]
impl FeedSyncers for SlowSyncers {
    async fn sync_feed(&self, _kind: FeedKind) -> Result<(), String> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(())
    }
    async fn update_scap_extra(&self) -> Result<(), String> {
        Ok(())
    }
    async fn sync_data(&self, _kind: DataObjectKind) -> Result<(), String> {
        Ok(())
    }
}

struct PlentyOfMemory;

impl MemoryProbe for PlentyOfMemory {
    fn phys_mem_available_mib(&self) -> u64 {
        u64::MAX
    }
}

fn deps() -> FeedSyncDeps {
    FeedSyncDeps {
        status: Arc::new(AlwaysStale),
        syncers: Arc::new(SlowSyncers),
        memory: Arc::new(PlentyOfMemory),
    }
}

#[tokio::test]
async fn holder_wins_and_the_other_returns_busy() {
    let dir = tempfile::tempdir().unwrap();
    let config = ControllerConfig {
        feed_lock_path: dir.path().join("feed-update.lock"),
        feed_lock_timeout: 1,
        ..ControllerConfig::default()
    };

    // Process A holds the lock; B gives up after its timeout and reports
    // busy rather than failing.
    let held = FileLock::acquire(&config.feed_lock_path).unwrap();
    let outcome = manage_sync(&config, &deps(), false).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Busy);

    // A finishes and releases; the lock file is observably empty.
    held.release().unwrap();
    assert_eq!(
        FileLock::read_stamp(&config.feed_lock_path).unwrap(),
        None
    );

    // B's next tick gets through.
    let outcome = manage_sync(&config, &deps(), false).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Synced { failures: 0 });
}
