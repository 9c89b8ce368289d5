// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sentra-adapters: sessions to the scanner engines the controller drives.
//!
//! Each scanner family gets a narrow async trait so the engine stays
//! testable; the real implementations speak the wire protocols (XML over
//! TLS for OSP, JSON over mTLS HTTP for the newer engines).

pub mod agent_ctl;
pub mod broker;
pub mod http_scan;
pub mod osp;
pub mod perf_graph;
pub mod relay;
pub mod results;
pub mod subprocess;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAgentController, FakeBroker, FakeHttpScan, FakeOsp, ScannerCall};

pub use agent_ctl::AgentControllerApi;
pub use broker::{NetworkBroker, ScanBroker};
pub use http_scan::{HttpScanApi, HttpScanPhase, HttpScanStatus};
pub use osp::{OspScanSpec, OspScanStatus, OspSession, OspStatus};
pub use relay::{RelayEndpoint, RelayProtocol};
pub use results::RawScanResult;

use thiserror::Error;

/// Errors from scanner sessions and the broker.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("scanner unreachable: {0}")]
    Unreachable(String),

    #[error("scanner protocol error: {0}")]
    Protocol(String),

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("helper process failed: {0}")]
    Helper(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdapterError {
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self::Unreachable(reason.into())
    }

    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol(reason.into())
    }
}
