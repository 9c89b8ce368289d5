// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The feed sync coordinator.
//!
//! Feed updates are globally exclusive across processes through the feed
//! file lock, and gated on available memory so a sync cannot push the
//! host into swap while scans run. Child syncers are supervised: one
//! failing feed never poisons the others, and the lock is always
//! released.

use crate::error::EngineError;
use crate::file_lock::FileLock;
use async_trait::async_trait;
use sentra_core::ControllerConfig;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// The three feed families synced together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Nvt,
    Scap,
    Cert,
}

impl FeedKind {
    pub const ALL: [FeedKind; 3] = [FeedKind::Nvt, FeedKind::Scap, FeedKind::Cert];
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeedKind::Nvt => "NVT",
            FeedKind::Scap => "SCAP",
            FeedKind::Cert => "CERT",
        };
        f.write_str(s)
    }
}

/// Managed data objects synced when drift is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataObjectKind {
    Configs,
    PortLists,
    ReportFormats,
    AgentInstallers,
}

impl fmt::Display for DataObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataObjectKind::Configs => "configs",
            DataObjectKind::PortLists => "port lists",
            DataObjectKind::ReportFormats => "report formats",
            DataObjectKind::AgentInstallers => "agent installers",
        };
        f.write_str(s)
    }
}

/// Reports which feeds and data objects are out of date.
pub trait FeedStatusProbe: Send + Sync {
    fn needs_update(&self, kind: FeedKind) -> bool;
    fn data_drift(&self) -> Vec<DataObjectKind>;
}

/// Performs the actual sync work (external sync helpers in production).
#[async_trait]
pub trait FeedSyncers: Send + Sync + 'static {
    async fn sync_feed(&self, kind: FeedKind) -> Result<(), String>;
    /// Post-sync SCAP refinement (severity recomputation and friends).
    async fn update_scap_extra(&self) -> Result<(), String>;
    async fn sync_data(&self, kind: DataObjectKind) -> Result<(), String>;
}

/// Physical memory probe, injectable for tests.
pub trait MemoryProbe: Send + Sync {
    fn phys_mem_available_mib(&self) -> u64;
}

/// The coordinator's collaborators.
pub struct FeedSyncDeps {
    pub status: Arc<dyn FeedStatusProbe>,
    pub syncers: Arc<dyn FeedSyncers>,
    pub memory: Arc<dyn MemoryProbe>,
}

/// What one coordination pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Nothing needed syncing.
    Idle,
    /// Sync ran; `failures` children reported errors.
    Synced { failures: usize },
    /// Another process holds the feed lock; retry next tick.
    Busy,
    /// Not enough free memory after the configured retries.
    MemoryLow,
}

/// Pause between feed-lock attempts.
const LOCK_RETRY_SPACING: Duration = Duration::from_secs(1);
/// Pause between memory re-checks.
const MEMORY_RETRY_SPACING: Duration = Duration::from_secs(1);

/// One coordination pass: check, gate, lock, sync, release.
pub async fn manage_sync(
    config: &ControllerConfig,
    deps: &FeedSyncDeps,
    try_data_sync: bool,
) -> Result<SyncOutcome, EngineError> {
    let feeds: Vec<FeedKind> = FeedKind::ALL
        .into_iter()
        .filter(|kind| deps.status.needs_update(*kind))
        .collect();
    let data: Vec<DataObjectKind> = if try_data_sync {
        deps.status.data_drift()
    } else {
        Vec::new()
    };
    if feeds.is_empty() && data.is_empty() {
        return Ok(SyncOutcome::Idle);
    }

    if !wait_for_memory(config, deps).await {
        tracing::warn!(
            min_mib = config.min_mem_feed_update,
            "not enough free memory for a feed update"
        );
        return Ok(SyncOutcome::MemoryLow);
    }

    let Some(lock) = acquire_feed_lock(config).await? else {
        tracing::info!("feed lock busy, retrying next tick");
        return Ok(SyncOutcome::Busy);
    };

    let mut failures = 0;

    // Supervised children, one per feed; a failure is logged and the
    // remaining feeds still sync.
    for kind in feeds.iter().copied() {
        let syncers = Arc::clone(&deps.syncers);
        let child = tokio::spawn(async move { syncers.sync_feed(kind).await });
        match child.await {
            Ok(Ok(())) => tracing::info!(feed = %kind, "feed synced"),
            Ok(Err(e)) => {
                tracing::error!(feed = %kind, error = e, "feed sync failed");
                failures += 1;
            }
            Err(e) => {
                tracing::error!(feed = %kind, error = %e, "feed sync child panicked");
                failures += 1;
            }
        }
    }

    if feeds.contains(&FeedKind::Scap) {
        if let Err(e) = deps.syncers.update_scap_extra().await {
            tracing::error!(error = e, "SCAP post-processing failed");
            failures += 1;
        }
    }

    // Data objects sync serially under the same lock.
    for kind in data {
        if let Err(e) = deps.syncers.sync_data(kind).await {
            tracing::error!(data = %kind, error = e, "data object sync failed");
            failures += 1;
        }
    }

    if let Err(e) = lock.release() {
        tracing::warn!(error = %e, "feed lock release failed");
    }
    Ok(SyncOutcome::Synced { failures })
}

/// Poll free memory until the budget is met or the retries run out.
/// A budget of zero disables the gate.
async fn wait_for_memory(config: &ControllerConfig, deps: &FeedSyncDeps) -> bool {
    if config.min_mem_feed_update == 0 {
        return true;
    }
    for attempt in 0..=config.mem_wait_retries {
        if deps.memory.phys_mem_available_mib() >= config.min_mem_feed_update {
            return true;
        }
        if attempt < config.mem_wait_retries {
            tokio::time::sleep(MEMORY_RETRY_SPACING).await;
        }
    }
    false
}

/// Nonblocking lock attempts until `feed_lock_timeout` elapses.
async fn acquire_feed_lock(config: &ControllerConfig) -> Result<Option<FileLock>, EngineError> {
    let deadline = std::time::Instant::now() + Duration::from_secs(config.feed_lock_timeout);
    loop {
        match FileLock::try_acquire(&config.feed_lock_path) {
            Ok(Some(lock)) => return Ok(Some(lock)),
            Ok(None) => {
                if std::time::Instant::now() >= deadline {
                    return Ok(None);
                }
                tokio::time::sleep(LOCK_RETRY_SPACING).await;
            }
            Err(e) => return Err(EngineError::Lock(e)),
        }
    }
}

#[cfg(test)]
#[path = "feed_sync_tests.rs"]
mod tests;
