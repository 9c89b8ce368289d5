// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sentra-storage: typed accessor surface over the resource store.
//!
//! The production store is an external relational database; this crate
//! defines the contract the task execution core needs from it, plus an
//! in-memory reference implementation used by the daemon's tests and by
//! deployments without a database (demo mode).

pub mod contract;
pub mod memory;
pub mod secinfo;

pub use contract::{StoreError, StoreOpener, TaskScheduleRow, TaskStore};
pub use memory::MemoryStore;
pub use secinfo::{CpeMatchNode, CveEntry};
