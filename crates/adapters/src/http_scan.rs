// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP scanner sessions: JSON over mTLS.
//!
//! The newer scanner exposes a small REST surface: create a scan from a
//! JSON config, start it, poll status, page results from an offset, stop
//! and delete. Results share the OSP result shape.

use crate::results::RawScanResult;
use crate::AdapterError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Lifecycle phase reported by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpScanPhase {
    Stored,
    Requested,
    Running,
    Stopped,
    Succeeded,
    Failed,
}

/// Status reply for one scan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HttpScanStatus {
    pub status: HttpScanPhase,
    #[serde(default)]
    pub progress: u8,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
}

/// A session to one HTTP scanner.
#[async_trait]
pub trait HttpScanApi: Send + Sync {
    /// Create a scan from its JSON configuration; returns the scan id.
    async fn create_scan(&self, config: serde_json::Value) -> Result<String, AdapterError>;
    async fn start_scan(&self, scan_id: &str) -> Result<(), AdapterError>;
    async fn scan_status(&self, scan_id: &str) -> Result<HttpScanStatus, AdapterError>;
    /// Fetch parsed results from `offset` onward.
    async fn scan_results(
        &self,
        scan_id: &str,
        offset: usize,
    ) -> Result<Vec<RawScanResult>, AdapterError>;
    async fn stop_scan(&self, scan_id: &str) -> Result<(), AdapterError>;
    async fn delete_scan(&self, scan_id: &str) -> Result<(), AdapterError>;
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            AdapterError::Unreachable(err.to_string())
        } else {
            AdapterError::Protocol(err.to_string())
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CreateScanReply {
    Bare(String),
    Object { id: String },
}

/// Real client over reqwest with client-certificate authentication.
pub struct HttpScanClient {
    base: String,
    client: reqwest::Client,
}

impl HttpScanClient {
    /// Build a client for `https://host:port`, trusting `ca_cert` and
    /// presenting `client_cert`+`client_key` when given.
    pub fn new(
        host: &str,
        port: u16,
        ca_cert: Option<&str>,
        client_cert: Option<&str>,
        client_key: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, AdapterError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout);
        if let Some(ca) = ca_cert {
            let cert = reqwest::Certificate::from_pem(ca.as_bytes())
                .map_err(|e| AdapterError::Tls(e.to_string()))?;
            builder = builder.add_root_certificate(cert);
        }
        if let (Some(cert), Some(key)) = (client_cert, client_key) {
            let identity_pem = format!("{key}\n{cert}");
            let identity = reqwest::Identity::from_pem(identity_pem.as_bytes())
                .map_err(|e| AdapterError::Tls(e.to_string()))?;
            builder = builder.identity(identity);
        }
        let client = builder
            .build()
            .map_err(|e| AdapterError::Tls(e.to_string()))?;
        Ok(Self {
            base: format!("https://{host}:{port}"),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// GET a JSON document relative to the base URL.
    pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, AdapterError> {
        let response = self.client.get(self.url(path)).send().await?;
        Ok(self.check(response).await?.json().await?)
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, AdapterError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(AdapterError::protocol(format!(
                "scanner replied {status}: {body}"
            )))
        }
    }
}

#[async_trait]
impl HttpScanApi for HttpScanClient {
    async fn create_scan(&self, config: serde_json::Value) -> Result<String, AdapterError> {
        let response = self
            .client
            .post(self.url("/scans"))
            .json(&config)
            .send()
            .await?;
        let reply: CreateScanReply = self.check(response).await?.json().await?;
        Ok(match reply {
            CreateScanReply::Bare(id) => id,
            CreateScanReply::Object { id } => id,
        })
    }

    async fn start_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        let response = self
            .client
            .post(self.url(&format!("/scans/{scan_id}")))
            .json(&serde_json::json!({ "action": "start" }))
            .send()
            .await?;
        self.check(response).await.map(|_| ())
    }

    async fn scan_status(&self, scan_id: &str) -> Result<HttpScanStatus, AdapterError> {
        let response = self
            .client
            .get(self.url(&format!("/scans/{scan_id}/status")))
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    async fn scan_results(
        &self,
        scan_id: &str,
        offset: usize,
    ) -> Result<Vec<RawScanResult>, AdapterError> {
        let response = self
            .client
            .get(self.url(&format!("/scans/{scan_id}/results?range={offset}-")))
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    async fn stop_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        let response = self
            .client
            .post(self.url(&format!("/scans/{scan_id}")))
            .json(&serde_json::json!({ "action": "stop" }))
            .send()
            .await?;
        self.check(response).await.map(|_| ())
    }

    async fn delete_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        let response = self
            .client
            .delete(self.url(&format!("/scans/{scan_id}")))
            .send()
            .await?;
        self.check(response).await.map(|_| ())
    }
}

#[cfg(test)]
#[path = "http_scan_tests.rs"]
mod tests;
