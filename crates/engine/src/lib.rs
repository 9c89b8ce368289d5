// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sentra-engine: the task execution core.
//!
//! Turns a declarative task into a running scan on a scanner, tracks it,
//! ingests its results and enforces the scheduling, concurrency and
//! lifecycle rules shared by every client session.

#[cfg(test)]
pub(crate) mod test_helpers;

pub mod cert;
pub mod dispatch;
pub mod error;
pub mod feed_sync;
pub mod file_lock;
pub mod lifecycle;
pub mod queue;
pub mod report_import;
pub mod runtime;
pub mod scheduler;
pub mod throttle;
pub mod worker;

pub use cert::truncate_certificate;
pub use dispatch::ScanOutcome;
pub use error::EngineError;
pub use feed_sync::{
    manage_sync, DataObjectKind, FeedKind, FeedStatusProbe, FeedSyncDeps, FeedSyncers,
    MemoryProbe, SyncOutcome,
};
pub use file_lock::FileLock;
pub use report_import::{report_lock_path, ReportImporter};
pub use runtime::{Engine, EngineDeps};
pub use scheduler::{AuthedSession, ClientConnector, ScheduleTickSummary};
pub use throttle::{AcquireOutcome, NamedSemaphore, Throttles};
pub use worker::WorkerExit;
