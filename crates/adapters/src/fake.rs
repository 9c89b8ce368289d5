// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted scanner sessions for tests.
//!
//! Each fake records every call it receives and plays back a scripted
//! sequence of status replies, so engine tests can walk a scan through
//! its lifecycle without a scanner.

use crate::agent_ctl::{AgentControllerApi, AgentInfo};
use crate::http_scan::{HttpScanApi, HttpScanPhase, HttpScanStatus};
use crate::osp::{OspFeedStatus, OspScanSpec, OspScanStatus, OspSession, OspStatus};
use crate::relay::{RelayEndpoint, RelayProtocol};
use crate::results::RawScanResult;
use crate::broker::ScanBroker;
use crate::AdapterError;
use async_trait::async_trait;
use parking_lot::Mutex;
use sentra_core::{Scanner, VtMeta};
use std::collections::VecDeque;
use std::sync::Arc;

/// A record of one call into a fake session.
#[derive(Debug, Clone, PartialEq)]
pub enum ScannerCall {
    OpenOsp { scanner: String },
    OpenHttp { scanner: String },
    OpenAgentController { scanner: String },
    StartScan { scan_id: String },
    GetScan { scan_id: String },
    StopScan { scan_id: String },
    DeleteScan { scan_id: String },
    GetVts,
    CheckFeed,
    CreateScan,
    ScanResults { offset: usize },
    ListAgents,
}

#[derive(Default)]
struct FakeOspState {
    statuses: VecDeque<OspScanStatus>,
    last_status: Option<OspScanStatus>,
    vts: Vec<VtMeta>,
    fail_start: Option<String>,
}

/// Scripted OSP session.
#[derive(Clone, Default)]
pub struct FakeOsp {
    calls: Arc<Mutex<Vec<ScannerCall>>>,
    state: Arc<Mutex<FakeOspState>>,
}

impl FakeOsp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the statuses successive `get_scan` calls will observe; the
    /// last one repeats once the queue drains.
    pub fn script_statuses(&self, statuses: Vec<OspScanStatus>) {
        self.state.lock().statuses = statuses.into();
    }

    pub fn script_vts(&self, vts: Vec<VtMeta>) {
        self.state.lock().vts = vts;
    }

    /// Make `start_scan` fail with an unreachable error.
    pub fn fail_start(&self, reason: &str) {
        self.state.lock().fail_start = Some(reason.to_string());
    }

    pub fn calls(&self) -> Vec<ScannerCall> {
        self.calls.lock().clone()
    }

    pub fn stop_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, ScannerCall::StopScan { .. }))
            .count()
    }

    fn record(&self, call: ScannerCall) {
        self.calls.lock().push(call);
    }
}

/// A running status with the given progress and no results.
pub fn osp_running(progress: u8) -> OspScanStatus {
    OspScanStatus {
        status: OspStatus::Running,
        progress,
        start_time: Some(1_704_067_260),
        end_time: None,
        results: Vec::new(),
    }
}

/// A terminal status of the given kind.
pub fn osp_terminal(status: OspStatus) -> OspScanStatus {
    OspScanStatus {
        status,
        progress: 100,
        start_time: Some(1_704_067_260),
        end_time: Some(1_704_067_900),
        results: Vec::new(),
    }
}

#[async_trait]
impl OspSession for FakeOsp {
    async fn start_scan(&self, spec: &OspScanSpec) -> Result<String, AdapterError> {
        self.record(ScannerCall::StartScan {
            scan_id: spec.scan_id.clone(),
        });
        if let Some(reason) = self.state.lock().fail_start.clone() {
            return Err(AdapterError::unreachable(reason));
        }
        Ok(spec.scan_id.clone())
    }

    async fn get_scan(&self, scan_id: &str) -> Result<OspScanStatus, AdapterError> {
        self.record(ScannerCall::GetScan {
            scan_id: scan_id.to_string(),
        });
        let mut state = self.state.lock();
        if let Some(next) = state.statuses.pop_front() {
            state.last_status = Some(next.clone());
            return Ok(next);
        }
        state
            .last_status
            .clone()
            .ok_or_else(|| AdapterError::protocol("no scripted status"))
    }

    async fn stop_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        self.record(ScannerCall::StopScan {
            scan_id: scan_id.to_string(),
        });
        Ok(())
    }

    async fn delete_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        self.record(ScannerCall::DeleteScan {
            scan_id: scan_id.to_string(),
        });
        Ok(())
    }

    async fn get_vts(&self) -> Result<Vec<VtMeta>, AdapterError> {
        self.record(ScannerCall::GetVts);
        Ok(self.state.lock().vts.clone())
    }

    async fn check_feed(&self) -> Result<OspFeedStatus, AdapterError> {
        self.record(ScannerCall::CheckFeed);
        Ok(OspFeedStatus {
            lockfile_in_use: false,
            self_test_ok: true,
        })
    }

    async fn get_performance(
        &self,
        _start: i64,
        _end: i64,
        _titles: &str,
    ) -> Result<String, AdapterError> {
        Ok(String::new())
    }
}

#[derive(Default)]
struct FakeHttpState {
    statuses: VecDeque<HttpScanStatus>,
    last_status: Option<HttpScanStatus>,
    results: Vec<RawScanResult>,
    created_configs: Vec<serde_json::Value>,
    fail_create: Option<String>,
    next_scan_id: Option<String>,
}

/// Scripted HTTP scanner session.
#[derive(Clone, Default)]
pub struct FakeHttpScan {
    calls: Arc<Mutex<Vec<ScannerCall>>>,
    state: Arc<Mutex<FakeHttpState>>,
}

impl FakeHttpScan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_statuses(&self, statuses: Vec<HttpScanStatus>) {
        self.state.lock().statuses = statuses.into();
    }

    /// All results the scanner will have produced; paging serves suffixes.
    pub fn script_results(&self, results: Vec<RawScanResult>) {
        self.state.lock().results = results;
    }

    pub fn script_scan_id(&self, id: &str) {
        self.state.lock().next_scan_id = Some(id.to_string());
    }

    pub fn fail_create(&self, reason: &str) {
        self.state.lock().fail_create = Some(reason.to_string());
    }

    pub fn calls(&self) -> Vec<ScannerCall> {
        self.calls.lock().clone()
    }

    /// Scan configs passed to `create_scan`, in order.
    pub fn created_configs(&self) -> Vec<serde_json::Value> {
        self.state.lock().created_configs.clone()
    }

    fn record(&self, call: ScannerCall) {
        self.calls.lock().push(call);
    }
}

/// An HTTP status with the given phase and progress.
pub fn http_status(phase: HttpScanPhase, progress: u8) -> HttpScanStatus {
    HttpScanStatus {
        status: phase,
        progress,
        start_time: Some(1_704_067_260),
        end_time: matches!(
            phase,
            HttpScanPhase::Succeeded | HttpScanPhase::Stopped | HttpScanPhase::Failed
        )
        .then_some(1_704_067_900),
    }
}

#[async_trait]
impl HttpScanApi for FakeHttpScan {
    async fn create_scan(&self, config: serde_json::Value) -> Result<String, AdapterError> {
        self.record(ScannerCall::CreateScan);
        let mut state = self.state.lock();
        if let Some(reason) = state.fail_create.clone() {
            return Err(AdapterError::unreachable(reason));
        }
        state.created_configs.push(config);
        Ok(state
            .next_scan_id
            .clone()
            .unwrap_or_else(|| "scan-http-1".to_string()))
    }

    async fn start_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        self.record(ScannerCall::StartScan {
            scan_id: scan_id.to_string(),
        });
        Ok(())
    }

    async fn scan_status(&self, scan_id: &str) -> Result<HttpScanStatus, AdapterError> {
        self.record(ScannerCall::GetScan {
            scan_id: scan_id.to_string(),
        });
        let mut state = self.state.lock();
        if let Some(next) = state.statuses.pop_front() {
            state.last_status = Some(next.clone());
            return Ok(next);
        }
        state
            .last_status
            .clone()
            .ok_or_else(|| AdapterError::protocol("no scripted status"))
    }

    async fn scan_results(
        &self,
        _scan_id: &str,
        offset: usize,
    ) -> Result<Vec<RawScanResult>, AdapterError> {
        self.record(ScannerCall::ScanResults { offset });
        let state = self.state.lock();
        Ok(state.results.get(offset..).unwrap_or_default().to_vec())
    }

    async fn stop_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        self.record(ScannerCall::StopScan {
            scan_id: scan_id.to_string(),
        });
        Ok(())
    }

    async fn delete_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        self.record(ScannerCall::DeleteScan {
            scan_id: scan_id.to_string(),
        });
        Ok(())
    }
}

/// Scripted agent controller: the HTTP fake plus an agent roster.
#[derive(Clone, Default)]
pub struct FakeAgentController {
    pub http: FakeHttpScan,
    agents: Arc<Mutex<Vec<AgentInfo>>>,
    payloads: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl FakeAgentController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script_agents(&self, agents: Vec<AgentInfo>) {
        *self.agents.lock() = agents;
    }

    /// Create-scan payloads received, in order.
    pub fn payloads(&self) -> Vec<serde_json::Value> {
        self.payloads.lock().clone()
    }
}

#[async_trait]
impl AgentControllerApi for FakeAgentController {
    async fn list_agents(&self) -> Result<Vec<AgentInfo>, AdapterError> {
        self.http.record(ScannerCall::ListAgents);
        Ok(self.agents.lock().clone())
    }

    async fn create_scan(
        &self,
        agents: &[String],
        config: serde_json::Value,
    ) -> Result<String, AdapterError> {
        self.payloads
            .lock()
            .push(crate::agent_ctl::build_agent_scan_payload(agents, &config));
        self.http.create_scan(config).await
    }

    async fn start_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        self.http.start_scan(scan_id).await
    }

    async fn scan_status(&self, scan_id: &str) -> Result<HttpScanStatus, AdapterError> {
        self.http.scan_status(scan_id).await
    }

    async fn scan_results(
        &self,
        scan_id: &str,
        offset: usize,
    ) -> Result<Vec<RawScanResult>, AdapterError> {
        self.http.scan_results(scan_id, offset).await
    }

    async fn stop_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        self.http.stop_scan(scan_id).await
    }

    async fn delete_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        self.http.delete_scan(scan_id).await
    }
}

#[derive(Default)]
struct FakeBrokerState {
    unreachable: Option<String>,
    relay: Option<RelayEndpoint>,
}

/// Broker that hands out the fakes above.
#[derive(Clone, Default)]
pub struct FakeBroker {
    pub osp: FakeOsp,
    pub http: FakeHttpScan,
    pub agent: FakeAgentController,
    calls: Arc<Mutex<Vec<ScannerCall>>>,
    state: Arc<Mutex<FakeBrokerState>>,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every open fail, as if the scanner were down.
    pub fn set_unreachable(&self, reason: &str) {
        self.state.lock().unreachable = Some(reason.to_string());
    }

    pub fn script_relay(&self, relay: RelayEndpoint) {
        self.state.lock().relay = Some(relay);
    }

    pub fn calls(&self) -> Vec<ScannerCall> {
        self.calls.lock().clone()
    }

    fn check_reachable(&self) -> Result<(), AdapterError> {
        match self.state.lock().unreachable.clone() {
            Some(reason) => Err(AdapterError::unreachable(reason)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ScanBroker for FakeBroker {
    async fn open_osp(
        &self,
        scanner: &Scanner,
    ) -> Result<Arc<dyn OspSession>, AdapterError> {
        self.calls.lock().push(ScannerCall::OpenOsp {
            scanner: scanner.id.to_string(),
        });
        self.check_reachable()?;
        Ok(Arc::new(self.osp.clone()))
    }

    async fn open_http_scanner(
        &self,
        scanner: &Scanner,
        _scan_id: Option<&str>,
    ) -> Result<Arc<dyn HttpScanApi>, AdapterError> {
        self.calls.lock().push(ScannerCall::OpenHttp {
            scanner: scanner.id.to_string(),
        });
        self.check_reachable()?;
        Ok(Arc::new(self.http.clone()))
    }

    async fn open_agent_controller(
        &self,
        scanner: &Scanner,
    ) -> Result<Arc<dyn AgentControllerApi>, AdapterError> {
        self.calls.lock().push(ScannerCall::OpenAgentController {
            scanner: scanner.id.to_string(),
        });
        self.check_reachable()?;
        Ok(Arc::new(self.agent.clone()))
    }

    async fn resolve_relay(
        &self,
        host: &str,
        port: u16,
        ca_cert: Option<&str>,
        _protocol: RelayProtocol,
    ) -> Result<Option<RelayEndpoint>, AdapterError> {
        Ok(Some(self.state.lock().relay.clone().unwrap_or(
            RelayEndpoint {
                host: host.to_string(),
                port,
                ca_cert: ca_cert.map(str::to_string),
            },
        )))
    }
}
