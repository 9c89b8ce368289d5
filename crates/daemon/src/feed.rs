// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Production feed collaborators: timestamp probes, sync helpers and the
//! physical memory gate.

use async_trait::async_trait;
use sentra_adapters::subprocess::{run_with_timeout, FEED_SYNC_TIMEOUT};
use sentra_engine::{DataObjectKind, FeedKind, FeedStatusProbe, FeedSyncers, MemoryProbe};
use std::path::{Path, PathBuf};
use tokio::process::Command;

fn feed_subdir(kind: FeedKind) -> &'static str {
    match kind {
        FeedKind::Nvt => "nvt",
        FeedKind::Scap => "scap",
        FeedKind::Cert => "cert",
    }
}

fn data_subdir(kind: DataObjectKind) -> &'static str {
    match kind {
        DataObjectKind::Configs => "data-objects/configs",
        DataObjectKind::PortLists => "data-objects/port-lists",
        DataObjectKind::ReportFormats => "data-objects/report-formats",
        DataObjectKind::AgentInstallers => "data-objects/agent-installers",
    }
}

fn read_stamp(path: &Path) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Compares each feed's upstream `timestamp` file with the stamp recorded
/// at the last successful sync.
pub struct TimestampFeedProbe {
    feed_dir: PathBuf,
}

impl TimestampFeedProbe {
    pub fn new(feed_dir: PathBuf) -> Self {
        Self { feed_dir }
    }

    fn upstream_stamp(&self, subdir: &str) -> Option<String> {
        read_stamp(&self.feed_dir.join(subdir).join("timestamp"))
    }

    fn synced_stamp(&self, subdir: &str) -> Option<String> {
        read_stamp(&self.feed_dir.join(subdir).join("synced"))
    }

    fn stale(&self, subdir: &str) -> bool {
        match (self.upstream_stamp(subdir), self.synced_stamp(subdir)) {
            (Some(upstream), Some(synced)) => upstream != synced,
            (Some(_), None) => true,
            // No upstream data at all: nothing to sync.
            (None, _) => false,
        }
    }
}

impl FeedStatusProbe for TimestampFeedProbe {
    fn needs_update(&self, kind: FeedKind) -> bool {
        self.stale(feed_subdir(kind))
    }

    fn data_drift(&self) -> Vec<DataObjectKind> {
        [
            DataObjectKind::Configs,
            DataObjectKind::PortLists,
            DataObjectKind::ReportFormats,
            DataObjectKind::AgentInstallers,
        ]
        .into_iter()
        .filter(|kind| self.stale(data_subdir(*kind)))
        .collect()
    }
}

/// Runs the external sync helper per feed and records the synced stamp.
pub struct CommandFeedSyncers {
    feed_dir: PathBuf,
    /// Sync helper executable; `None` degrades every sync to a no-op
    /// stamp copy (air-gapped installations that rsync out of band).
    sync_helper: Option<PathBuf>,
}

impl CommandFeedSyncers {
    pub fn new(feed_dir: PathBuf, sync_helper: Option<PathBuf>) -> Self {
        Self {
            feed_dir,
            sync_helper,
        }
    }

    async fn sync_subdir(&self, subdir: &str, what: &str) -> Result<(), String> {
        if let Some(helper) = &self.sync_helper {
            let mut cmd = Command::new(helper);
            cmd.arg("--type").arg(what);
            let output = run_with_timeout(cmd, FEED_SYNC_TIMEOUT, "feed sync helper").await?;
            if !output.status.success() {
                return Err(format!(
                    "sync helper exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ));
            }
        }
        // Record the upstream stamp as synced.
        let dir = self.feed_dir.join(subdir);
        match read_stamp(&dir.join("timestamp")) {
            Some(stamp) => {
                std::fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
                std::fs::write(dir.join("synced"), stamp).map_err(|e| e.to_string())
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl FeedSyncers for CommandFeedSyncers {
    async fn sync_feed(&self, kind: FeedKind) -> Result<(), String> {
        let what = match kind {
            FeedKind::Nvt => "nvt",
            FeedKind::Scap => "scap",
            FeedKind::Cert => "cert",
        };
        self.sync_subdir(feed_subdir(kind), what).await
    }

    async fn update_scap_extra(&self) -> Result<(), String> {
        // Severity recomputation over freshly synced SCAP data is done by
        // the store backend; this hook only logs the request here.
        tracing::debug!("SCAP post-processing requested");
        Ok(())
    }

    async fn sync_data(&self, kind: DataObjectKind) -> Result<(), String> {
        let what = match kind {
            DataObjectKind::Configs => "configs",
            DataObjectKind::PortLists => "port-lists",
            DataObjectKind::ReportFormats => "report-formats",
            DataObjectKind::AgentInstallers => "agent-installers",
        };
        self.sync_subdir(data_subdir(kind), what).await
    }
}

/// Reads free memory from /proc/meminfo.
pub struct ProcMemoryProbe;

impl ProcMemoryProbe {
    fn parse_available_kib(meminfo: &str) -> Option<u64> {
        meminfo
            .lines()
            .find(|line| line.starts_with("MemAvailable:"))
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|v| v.parse().ok())
    }
}

impl MemoryProbe for ProcMemoryProbe {
    fn phys_mem_available_mib(&self) -> u64 {
        match std::fs::read_to_string("/proc/meminfo") {
            Ok(text) => Self::parse_available_kib(&text).unwrap_or(u64::MAX) / 1024,
            // No meminfo (non-Linux): never block syncs on the gate.
            Err(_) => u64::MAX,
        }
    }
}

#[cfg(test)]
#[path = "feed_tests.rs"]
mod tests;
