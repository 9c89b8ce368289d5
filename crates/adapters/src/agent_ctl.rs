// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent-controller sessions.
//!
//! The agent controller creates scans from a list of deployed agents
//! instead of a host target; status and result paging mirror the HTTP
//! scanner surface.

use crate::http_scan::{HttpScanClient, HttpScanStatus};
use crate::results::RawScanResult;
use crate::AdapterError;
use crate::HttpScanApi;
use async_trait::async_trait;
use serde::Deserialize;

/// One deployed agent as listed by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    #[serde(default)]
    pub hostname: String,
}

/// A session to one agent controller.
#[async_trait]
pub trait AgentControllerApi: Send + Sync {
    /// Agents currently known to the controller.
    async fn list_agents(&self) -> Result<Vec<AgentInfo>, AdapterError>;

    /// Create a scan across the given agents; returns the scan id.
    async fn create_scan(
        &self,
        agents: &[String],
        config: serde_json::Value,
    ) -> Result<String, AdapterError>;

    async fn start_scan(&self, scan_id: &str) -> Result<(), AdapterError>;
    async fn scan_status(&self, scan_id: &str) -> Result<HttpScanStatus, AdapterError>;
    async fn scan_results(
        &self,
        scan_id: &str,
        offset: usize,
    ) -> Result<Vec<RawScanResult>, AdapterError>;
    async fn stop_scan(&self, scan_id: &str) -> Result<(), AdapterError>;
    async fn delete_scan(&self, scan_id: &str) -> Result<(), AdapterError>;
}

/// Build the create-scan payload for an agent list.
pub fn build_agent_scan_payload(
    agents: &[String],
    config: &serde_json::Value,
) -> serde_json::Value {
    serde_json::json!({
        "agents": agents,
        "config": config,
    })
}

/// Real client: the shared HTTP surface plus agent listing.
pub struct AgentControllerClient {
    inner: HttpScanClient,
}

impl AgentControllerClient {
    pub fn new(inner: HttpScanClient) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl AgentControllerApi for AgentControllerClient {
    async fn list_agents(&self) -> Result<Vec<AgentInfo>, AdapterError> {
        self.inner.get_json("/agents").await
    }

    async fn create_scan(
        &self,
        agents: &[String],
        config: serde_json::Value,
    ) -> Result<String, AdapterError> {
        let payload = build_agent_scan_payload(agents, &config);
        self.inner.create_scan(payload).await
    }

    async fn start_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        self.inner.start_scan(scan_id).await
    }

    async fn scan_status(&self, scan_id: &str) -> Result<HttpScanStatus, AdapterError> {
        self.inner.scan_status(scan_id).await
    }

    async fn scan_results(
        &self,
        scan_id: &str,
        offset: usize,
    ) -> Result<Vec<RawScanResult>, AdapterError> {
        self.inner.scan_results(scan_id, offset).await
    }

    async fn stop_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        self.inner.stop_scan(scan_id).await
    }

    async fn delete_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        self.inner.delete_scan(scan_id).await
    }
}

#[cfg(test)]
#[path = "agent_ctl_tests.rs"]
mod tests;
