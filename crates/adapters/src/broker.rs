// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection broker: opens scanner sessions by kind, with retries and
//! relay resolution for sensors.

use crate::agent_ctl::{AgentControllerApi, AgentControllerClient};
use crate::http_scan::{HttpScanApi, HttpScanClient};
use crate::osp::{OspEndpoint, OspSession, TlsOspSession};
use crate::relay::{resolve_with_mapper, RelayEndpoint, RelayProtocol};
use crate::AdapterError;
use async_trait::async_trait;
use sentra_core::{Scanner, ScannerKind};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Spacing between scanner connection attempts.
const RETRY_SPACING: Duration = Duration::from_secs(1);

/// Per-command network timeout for scanner sessions.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Opens sessions to scanners.
#[async_trait]
pub trait ScanBroker: Send + Sync + 'static {
    async fn open_osp(&self, scanner: &Scanner) -> Result<Arc<dyn OspSession>, AdapterError>;

    /// `scan_id` may be absent at discovery time (feed queries).
    async fn open_http_scanner(
        &self,
        scanner: &Scanner,
        scan_id: Option<&str>,
    ) -> Result<Arc<dyn HttpScanApi>, AdapterError>;

    async fn open_agent_controller(
        &self,
        scanner: &Scanner,
    ) -> Result<Arc<dyn AgentControllerApi>, AdapterError>;

    /// Translate an endpoint through the relay mapper; identity when no
    /// mapper is configured.
    async fn resolve_relay(
        &self,
        host: &str,
        port: u16,
        ca_cert: Option<&str>,
        protocol: RelayProtocol,
    ) -> Result<Option<RelayEndpoint>, AdapterError>;
}

/// The production broker.
pub struct NetworkBroker {
    /// Connection attempts per open.
    pub connection_retry: u32,
    /// Relay mapper executable, when deployed with sensors.
    pub relay_mapper: Option<PathBuf>,
}

impl NetworkBroker {
    pub fn new(connection_retry: u32, relay_mapper: Option<PathBuf>) -> Self {
        Self {
            connection_retry: connection_retry.max(1),
            relay_mapper,
        }
    }

    /// The endpoint a scanner is actually reached at: sensors go through
    /// the relay, everything else connects directly.
    async fn endpoint_for(
        &self,
        scanner: &Scanner,
        protocol: RelayProtocol,
    ) -> Result<(String, u16, Option<String>), AdapterError> {
        if scanner.kind.is_sensor() {
            if let Some(relay) = self
                .resolve_relay(
                    &scanner.host,
                    scanner.port,
                    scanner.ca_cert.as_deref(),
                    protocol,
                )
                .await?
            {
                let ca = relay.ca_cert.or_else(|| scanner.ca_cert.clone());
                return Ok((relay.host, relay.port, ca));
            }
            return Err(AdapterError::unreachable(format!(
                "no relay found for sensor {}:{}",
                scanner.host, scanner.port
            )));
        }
        Ok((scanner.host.clone(), scanner.port, scanner.ca_cert.clone()))
    }

    /// Retry an open operation with fixed spacing.
    async fn with_retries<T, F, Fut>(&self, mut attempt: F) -> Result<T, AdapterError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, AdapterError>>,
    {
        let mut last = None;
        for n in 0..self.connection_retry {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err @ AdapterError::Unreachable(_)) => {
                    tracing::warn!(attempt = n + 1, error = %err, "scanner connection failed");
                    last = Some(err);
                    if n + 1 < self.connection_retry {
                        tokio::time::sleep(RETRY_SPACING).await;
                    }
                }
                Err(other) => return Err(other),
            }
        }
        Err(last.unwrap_or_else(|| AdapterError::unreachable("no connection attempts made")))
    }
}

#[async_trait]
impl ScanBroker for NetworkBroker {
    async fn open_osp(&self, scanner: &Scanner) -> Result<Arc<dyn OspSession>, AdapterError> {
        let (host, port, ca_cert) = self.endpoint_for(scanner, RelayProtocol::Osp).await?;
        let endpoint = OspEndpoint {
            host,
            port,
            unix_socket: scanner.unix_socket.clone(),
            ca_cert,
            client_cert: scanner.client_cert.clone(),
            client_key: scanner.client_key.clone(),
            command_timeout: COMMAND_TIMEOUT,
        };
        self.with_retries(|| {
            let endpoint = endpoint.clone();
            async move {
                let session = TlsOspSession::new(endpoint)?;
                // Probe the scanner so "open" means reachable.
                session.check_feed().await?;
                Ok(Arc::new(session) as Arc<dyn OspSession>)
            }
        })
        .await
    }

    async fn open_http_scanner(
        &self,
        scanner: &Scanner,
        scan_id: Option<&str>,
    ) -> Result<Arc<dyn HttpScanApi>, AdapterError> {
        let _ = scan_id; // connection setup is scan-independent over HTTP
        let (host, port, ca_cert) = self.endpoint_for(scanner, RelayProtocol::Gmp).await?;
        let client = HttpScanClient::new(
            &host,
            port,
            ca_cert.as_deref(),
            scanner.client_cert.as_deref(),
            scanner.client_key.as_deref(),
            COMMAND_TIMEOUT,
        )?;
        Ok(Arc::new(client))
    }

    async fn open_agent_controller(
        &self,
        scanner: &Scanner,
    ) -> Result<Arc<dyn AgentControllerApi>, AdapterError> {
        let (host, port, ca_cert) = self.endpoint_for(scanner, RelayProtocol::Gmp).await?;
        let client = HttpScanClient::new(
            &host,
            port,
            ca_cert.as_deref(),
            scanner.client_cert.as_deref(),
            scanner.client_key.as_deref(),
            COMMAND_TIMEOUT,
        )?;
        Ok(Arc::new(AgentControllerClient::new(client)))
    }

    async fn resolve_relay(
        &self,
        host: &str,
        port: u16,
        ca_cert: Option<&str>,
        protocol: RelayProtocol,
    ) -> Result<Option<RelayEndpoint>, AdapterError> {
        match &self.relay_mapper {
            None => Ok(Some(RelayEndpoint {
                host: host.to_string(),
                port,
                ca_cert: ca_cert.map(str::to_string),
            })),
            Some(mapper) => resolve_with_mapper(mapper, host, port, protocol).await,
        }
    }
}

/// Scanner kinds the broker knows how to open.
pub fn broker_protocol_for(kind: ScannerKind) -> Option<&'static str> {
    match kind {
        ScannerKind::Osp | ScannerKind::OspSensor => Some("osp"),
        ScannerKind::HttpScanner | ScannerKind::HttpScannerSensor => Some("http"),
        ScannerKind::AgentController | ScannerKind::AgentControllerSensor => Some("agent"),
        ScannerKind::Cve | ScannerKind::ContainerImage => None,
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
