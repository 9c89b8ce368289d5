// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: paths, startup lock, shutdown.

use fs2::FileExt;
use sentra_core::ControllerConfig;
use std::fs::File;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Daemon path configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. /var/lib/sentra).
    pub state_dir: PathBuf,
    /// Path to lock/PID file.
    pub lock_path: PathBuf,
    /// Path to the daemon log file.
    pub log_path: PathBuf,
    /// Path to the TOML settings file.
    pub settings_path: PathBuf,
    /// Directory for per-report import locks.
    pub report_locks_dir: PathBuf,
    /// Feed data directories, one per feed family.
    pub feed_dir: PathBuf,
    /// Engine tuning knobs, loaded from the settings file.
    pub controller: ControllerConfig,
}

impl Config {
    /// Load configuration for the daemon.
    ///
    /// The state directory comes from `SENTRA_STATE_DIR`, falling back to
    /// the user state directory, then `/var/lib/sentra`.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = state_dir()?;
        Self::load_from(state_dir)
    }

    /// Load with an explicit state directory (used by tests).
    pub fn load_from(state_dir: PathBuf) -> Result<Self, LifecycleError> {
        let settings_path = state_dir.join("sentrad.toml");
        let mut controller = match std::fs::read_to_string(&settings_path) {
            Ok(text) => ControllerConfig::from_toml(&text)
                .map_err(|e| LifecycleError::BadSettings(settings_path.clone(), e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ControllerConfig::default(),
            Err(e) => return Err(LifecycleError::Io(e)),
        };
        // The feed lock lives under the state dir unless configured away.
        if controller.feed_lock_path == ControllerConfig::default().feed_lock_path {
            controller.feed_lock_path = state_dir.join("feed-update.lock");
        }

        Ok(Self {
            lock_path: state_dir.join("sentrad.pid"),
            log_path: state_dir.join("sentrad.log"),
            report_locks_dir: state_dir.join("report-locks"),
            feed_dir: state_dir.join("feed"),
            settings_path,
            state_dir,
            controller,
        })
    }
}

fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("SENTRA_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = dirs::state_dir() {
        return Ok(dir.join("sentra"));
    }
    Ok(PathBuf::from("/var/lib/sentra"))
}

/// Holds the daemon's exclusive pid lock for its lifetime.
pub struct PidLock {
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    file: File,
    path: PathBuf,
}

impl PidLock {
    /// Take the pid lock, refusing to start twice.
    pub fn acquire(config: &Config) -> Result<PidLock, LifecycleError> {
        std::fs::create_dir_all(&config.state_dir)?;
        std::fs::create_dir_all(&config.report_locks_dir)?;
        let file = File::create(&config.lock_path)?;
        file.try_lock_exclusive()
            .map_err(LifecycleError::LockFailed)?;
        use std::io::Write;
        let mut f = &file;
        writeln!(f, "{}", std::process::id())?;
        info!(path = %config.lock_path.display(), "daemon lock acquired");
        Ok(PidLock {
            file,
            path: config.lock_path.clone(),
        })
    }

    /// Remove the pid file on orderly shutdown.
    pub fn shutdown(self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(error = %e, "failed to remove pid file");
        }
        info!("daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("bad settings file {0}: {1}")]
    BadSettings(PathBuf, String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
