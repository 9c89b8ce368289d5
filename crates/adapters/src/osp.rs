// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OSP scanner sessions: XML envelopes over TLS (or a UNIX socket).
//!
//! The protocol is one envelope per connection; the scanner closes the
//! stream after its reply, so every command opens, writes, reads to EOF
//! and drops the connection. Envelope building and reply parsing are free
//! functions so they stay testable without a scanner.

use crate::results::RawScanResult;
use crate::AdapterError;
use async_trait::async_trait;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use sentra_core::VtMeta;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

/// Scan status words an OSP scanner reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OspStatus {
    Queued,
    Init,
    Running,
    Stopped,
    Finished,
    Interrupted,
}

impl OspStatus {
    pub fn parse(word: &str) -> Option<OspStatus> {
        match word {
            "queued" => Some(OspStatus::Queued),
            "init" => Some(OspStatus::Init),
            "running" => Some(OspStatus::Running),
            "stopped" => Some(OspStatus::Stopped),
            "finished" => Some(OspStatus::Finished),
            "interrupted" => Some(OspStatus::Interrupted),
            _ => None,
        }
    }
}

/// Parsed `get_scans` reply for one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct OspScanStatus {
    pub status: OspStatus,
    pub progress: u8,
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
    pub results: Vec<RawScanResult>,
}

/// One credential rendered for the scanner, already decrypted.
///
/// The decrypted field values are wiped when the spec drops.
#[derive(Debug, Clone, zeroize::Zeroize, zeroize::ZeroizeOnDrop)]
pub struct OspCredential {
    /// Credential type word, e.g. `up`, `usk`, `snmp`, `krb5`.
    pub kind: String,
    /// Service the credential applies to, e.g. `ssh`, `smb`.
    pub service: String,
    pub port: Option<u16>,
    /// Field name/value pairs (`username`, `password`, ...).
    pub fields: Vec<(String, String)>,
}

/// Target section of a `start_scan` envelope.
#[derive(Debug, Clone, Default)]
pub struct OspTargetSpec {
    pub hosts: String,
    pub exclude_hosts: String,
    pub ports: String,
    pub alive_tests: u32,
    pub reverse_lookup_only: bool,
    pub reverse_lookup_unify: bool,
    pub credentials: Vec<OspCredential>,
}

/// One selected VT with its values.
#[derive(Debug, Clone)]
pub struct OspVt {
    pub oid: String,
    pub values: BTreeMap<String, String>,
}

/// Everything needed to start a scan.
#[derive(Debug, Clone)]
pub struct OspScanSpec {
    pub scan_id: String,
    pub target: OspTargetSpec,
    pub vts: Vec<OspVt>,
    pub scanner_params: BTreeMap<String, String>,
}

/// Feed state reported by `check_feed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OspFeedStatus {
    pub lockfile_in_use: bool,
    pub self_test_ok: bool,
}

/// A session to one OSP scanner.
#[async_trait]
pub trait OspSession: Send + Sync {
    async fn start_scan(&self, spec: &OspScanSpec) -> Result<String, AdapterError>;
    async fn get_scan(&self, scan_id: &str) -> Result<OspScanStatus, AdapterError>;
    async fn stop_scan(&self, scan_id: &str) -> Result<(), AdapterError>;
    async fn delete_scan(&self, scan_id: &str) -> Result<(), AdapterError>;
    async fn get_vts(&self) -> Result<Vec<VtMeta>, AdapterError>;
    async fn check_feed(&self) -> Result<OspFeedStatus, AdapterError>;
    async fn get_performance(
        &self,
        start: i64,
        end: i64,
        titles: &str,
    ) -> Result<String, AdapterError>;
}

impl std::fmt::Debug for dyn OspSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn OspSession")
    }
}

// === Envelope building ===

pub fn build_start_scan(spec: &OspScanSpec) -> String {
    let mut xml = String::new();
    let _ = write!(xml, "<start_scan scan_id=\"{}\">", escape(&spec.scan_id));
    xml.push_str("<targets><target>");
    let _ = write!(xml, "<hosts>{}</hosts>", escape(&spec.target.hosts));
    if !spec.target.exclude_hosts.is_empty() {
        let _ = write!(
            xml,
            "<exclude_hosts>{}</exclude_hosts>",
            escape(&spec.target.exclude_hosts)
        );
    }
    if !spec.target.ports.is_empty() {
        let _ = write!(xml, "<ports>{}</ports>", escape(&spec.target.ports));
    }
    let _ = write!(xml, "<alive_test>{}</alive_test>", spec.target.alive_tests);
    if spec.target.reverse_lookup_only {
        xml.push_str("<reverse_lookup_only>1</reverse_lookup_only>");
    }
    if spec.target.reverse_lookup_unify {
        xml.push_str("<reverse_lookup_unify>1</reverse_lookup_unify>");
    }
    if !spec.target.credentials.is_empty() {
        xml.push_str("<credentials>");
        for credential in &spec.target.credentials {
            let _ = write!(
                xml,
                "<credential type=\"{}\" service=\"{}\"",
                escape(&credential.kind),
                escape(&credential.service)
            );
            if let Some(port) = credential.port {
                let _ = write!(xml, " port=\"{}\"", port);
            }
            xml.push('>');
            for (name, value) in &credential.fields {
                let _ = write!(xml, "<{0}>{1}</{0}>", name, escape(value));
            }
            xml.push_str("</credential>");
        }
        xml.push_str("</credentials>");
    }
    xml.push_str("</target></targets>");

    xml.push_str("<vt_selection>");
    for vt in &spec.vts {
        if vt.values.is_empty() {
            let _ = write!(xml, "<vt_single id=\"{}\"/>", escape(&vt.oid));
        } else {
            let _ = write!(xml, "<vt_single id=\"{}\">", escape(&vt.oid));
            for (id, value) in &vt.values {
                let _ = write!(
                    xml,
                    "<vt_value id=\"{}\">{}</vt_value>",
                    escape(id),
                    escape(value)
                );
            }
            xml.push_str("</vt_single>");
        }
    }
    xml.push_str("</vt_selection>");

    if !spec.scanner_params.is_empty() {
        xml.push_str("<scanner_params>");
        for (key, value) in &spec.scanner_params {
            let _ = write!(xml, "<{0}>{1}</{0}>", key, escape(value));
        }
        xml.push_str("</scanner_params>");
    }
    xml.push_str("</start_scan>");
    xml
}

pub fn build_get_scans(scan_id: &str) -> String {
    format!(
        "<get_scans scan_id=\"{}\" details=\"1\" progress=\"1\" pop_results=\"1\"/>",
        escape(scan_id)
    )
}

pub fn build_stop_scan(scan_id: &str) -> String {
    format!("<stop_scan scan_id=\"{}\"/>", escape(scan_id))
}

pub fn build_delete_scan(scan_id: &str) -> String {
    format!("<delete_scan scan_id=\"{}\"/>", escape(scan_id))
}

pub fn build_get_performance(start: i64, end: i64, titles: &str) -> String {
    format!(
        "<get_performance start=\"{}\" end=\"{}\" titles=\"{}\"/>",
        start,
        end,
        escape(titles)
    )
}

// === Reply parsing ===

fn attr_string(e: &quick_xml::events::BytesStart<'_>, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Check the `status` attribute of a reply root and return its text.
fn require_ok(
    e: &quick_xml::events::BytesStart<'_>,
    command: &str,
) -> Result<(), AdapterError> {
    let status = attr_string(e, "status").unwrap_or_default();
    if status == "200" {
        Ok(())
    } else {
        let text = attr_string(e, "status_text").unwrap_or_default();
        Err(AdapterError::protocol(format!(
            "{command} failed: status {status} {text}"
        )))
    }
}

/// Parse a `start_scan` reply into the scanner-assigned scan id.
pub fn parse_start_scan_reply(xml: &str) -> Result<String, AdapterError> {
    let mut reader = Reader::from_str(xml);
    let mut in_id = false;
    let mut id = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                match e.local_name().as_ref() {
                    b"start_scan_response" => require_ok(&e, "start_scan")?,
                    b"id" => in_id = true,
                    _ => {}
                }
            }
            Ok(Event::Text(t)) if in_id => {
                id = t
                    .unescape()
                    .map_err(|e| AdapterError::protocol(e.to_string()))?
                    .into_owned();
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"id" => in_id = false,
            Ok(Event::Eof) => break,
            Err(e) => return Err(AdapterError::protocol(e.to_string())),
            _ => {}
        }
    }
    if id.is_empty() {
        return Err(AdapterError::protocol("start_scan reply carried no id"));
    }
    Ok(id)
}

/// Parse a `get_scans` reply.
pub fn parse_scan_reply(xml: &str) -> Result<OspScanStatus, AdapterError> {
    let mut reader = Reader::from_str(xml);
    let mut status = None;
    let mut progress = 0u8;
    let mut start_time = None;
    let mut end_time = None;
    let mut results = Vec::new();
    let mut current: Option<RawScanResult> = None;

    fn result_from_attrs(e: &quick_xml::events::BytesStart<'_>) -> RawScanResult {
        RawScanResult {
            host: attr_string(e, "host").unwrap_or_default(),
            port: attr_string(e, "port").unwrap_or_default(),
            oid: attr_string(e, "test_id").unwrap_or_default(),
            severity: attr_string(e, "severity")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.0),
            qod: attr_string(e, "qod").and_then(|q| q.parse().ok()).unwrap_or(0),
            description: String::new(),
        }
    }

    fn scan_attrs(
        e: &quick_xml::events::BytesStart<'_>,
    ) -> Result<(OspStatus, u8, Option<i64>, Option<i64>), AdapterError> {
        let word = attr_string(e, "status").unwrap_or_default();
        let status = OspStatus::parse(&word)
            .ok_or_else(|| AdapterError::protocol(format!("unknown scan status: {word}")))?;
        let progress = attr_string(e, "progress")
            .and_then(|p| p.parse().ok())
            .unwrap_or(0);
        let start = attr_string(e, "start_time").and_then(|t| t.parse().ok());
        let end = attr_string(e, "end_time").and_then(|t| t.parse().ok());
        Ok((status, progress, start, end))
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"get_scans_response" => require_ok(&e, "get_scans")?,
                b"scan" => {
                    let (s, p, st, en) = scan_attrs(&e)?;
                    status = Some(s);
                    progress = p;
                    start_time = st;
                    end_time = en;
                }
                b"result" => current = Some(result_from_attrs(&e)),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"get_scans_response" => require_ok(&e, "get_scans")?,
                b"scan" => {
                    let (s, p, st, en) = scan_attrs(&e)?;
                    status = Some(s);
                    progress = p;
                    start_time = st;
                    end_time = en;
                }
                // Self-closing result: no body text to wait for.
                b"result" => results.push(result_from_attrs(&e)),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some(ref mut result) = current {
                    result.description.push_str(
                        &t.unescape()
                            .map_err(|e| AdapterError::protocol(e.to_string()))?,
                    );
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"result" => {
                if let Some(result) = current.take() {
                    results.push(result);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AdapterError::protocol(e.to_string())),
            _ => {}
        }
    }

    Ok(OspScanStatus {
        status: status.ok_or_else(|| AdapterError::protocol("get_scans reply carried no scan"))?,
        progress,
        start_time,
        end_time,
        results,
    })
}

/// Parse a bare-acknowledgement reply (`stop_scan`, `delete_scan`).
pub fn parse_ack_reply(xml: &str, command: &str) -> Result<(), AdapterError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                if e.local_name().as_ref().ends_with(b"_response") {
                    return require_ok(&e, command);
                }
            }
            Ok(Event::Eof) => {
                return Err(AdapterError::protocol(format!("{command} reply empty")))
            }
            Err(e) => return Err(AdapterError::protocol(e.to_string())),
            _ => {}
        }
    }
}

/// Parse a `get_vts` reply into cached VT metadata.
pub fn parse_vts_reply(xml: &str) -> Result<Vec<VtMeta>, AdapterError> {
    let mut reader = Reader::from_str(xml);
    let mut vts = Vec::new();
    let mut current: Option<VtMeta> = None;
    let mut in_name = false;

    fn vt_from_attrs(e: &quick_xml::events::BytesStart<'_>) -> VtMeta {
        VtMeta {
            oid: attr_string(e, "id").unwrap_or_default(),
            name: String::new(),
            tags: attr_string(e, "tags")
                .map(|t| t.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
        }
    }

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"get_vts_response" => require_ok(&e, "get_vts")?,
                b"vt" => current = Some(vt_from_attrs(&e)),
                b"name" => in_name = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"get_vts_response" => require_ok(&e, "get_vts")?,
                b"vt" => vts.push(vt_from_attrs(&e)),
                _ => {}
            },
            Ok(Event::Text(t)) if in_name => {
                if let Some(ref mut vt) = current {
                    vt.name = t
                        .unescape()
                        .map_err(|e| AdapterError::protocol(e.to_string()))?
                        .into_owned();
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"name" => in_name = false,
                b"vt" => {
                    if let Some(vt) = current.take() {
                        vts.push(vt);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(AdapterError::protocol(e.to_string())),
            _ => {}
        }
    }
    Ok(vts)
}

/// Parse a `check_feed` reply.
pub fn parse_feed_reply(xml: &str) -> Result<OspFeedStatus, AdapterError> {
    let mut reader = Reader::from_str(xml);
    let mut lockfile_in_use = false;
    let mut self_test_ok = true;
    let mut element = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"check_feed_response" {
                    require_ok(&e, "check_feed")?;
                }
                element = e.local_name().as_ref().to_vec();
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| AdapterError::protocol(e.to_string()))?;
                match element.as_slice() {
                    b"lockfile_in_use" => lockfile_in_use = text.trim() == "1",
                    b"self_test_exit_error" => self_test_ok = text.trim() != "1",
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AdapterError::protocol(e.to_string())),
            _ => {}
        }
    }
    Ok(OspFeedStatus {
        lockfile_in_use,
        self_test_ok,
    })
}

/// Parse a `get_performance` reply into its (possibly base64) body.
pub fn parse_performance_reply(xml: &str) -> Result<String, AdapterError> {
    let mut reader = Reader::from_str(xml);
    let mut body = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"get_performance_response" => {
                require_ok(&e, "get_performance")?;
            }
            Ok(Event::Text(t)) => {
                body.push_str(
                    &t.unescape()
                        .map_err(|e| AdapterError::protocol(e.to_string()))?,
                );
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AdapterError::protocol(e.to_string())),
            _ => {}
        }
    }
    Ok(body)
}

// === Wire transport ===

/// Where and how to reach one OSP scanner.
#[derive(Debug, Clone)]
pub struct OspEndpoint {
    pub host: String,
    pub port: u16,
    pub unix_socket: Option<PathBuf>,
    pub ca_cert: Option<String>,
    pub client_cert: Option<String>,
    pub client_key: Option<String>,
    pub command_timeout: Duration,
}

/// Real OSP session: one connection per envelope.
pub struct TlsOspSession {
    endpoint: OspEndpoint,
    tls: Option<Arc<ClientConfig>>,
}

impl TlsOspSession {
    pub fn new(endpoint: OspEndpoint) -> Result<Self, AdapterError> {
        let tls = if endpoint.unix_socket.is_some() {
            None
        } else {
            Some(Arc::new(build_tls_config(&endpoint)?))
        };
        Ok(Self { endpoint, tls })
    }

    /// Send one envelope and read the reply to EOF.
    async fn exchange(&self, envelope: &str) -> Result<String, AdapterError> {
        let reply = tokio::time::timeout(self.endpoint.command_timeout, async {
            match &self.endpoint.unix_socket {
                Some(path) => {
                    let mut stream = UnixStream::connect(path)
                        .await
                        .map_err(|e| AdapterError::unreachable(e.to_string()))?;
                    stream.write_all(envelope.as_bytes()).await?;
                    stream.shutdown().await?;
                    let mut reply = Vec::new();
                    stream.read_to_end(&mut reply).await?;
                    Ok::<Vec<u8>, AdapterError>(reply)
                }
                None => {
                    let address = format!("{}:{}", self.endpoint.host, self.endpoint.port);
                    let tcp = TcpStream::connect(&address)
                        .await
                        .map_err(|e| AdapterError::unreachable(e.to_string()))?;
                    let config = self
                        .tls
                        .clone()
                        .ok_or_else(|| AdapterError::Tls("missing TLS config".to_string()))?;
                    let server_name = ServerName::try_from(self.endpoint.host.clone())
                        .map_err(|e| AdapterError::Tls(e.to_string()))?;
                    let connector = TlsConnector::from(config);
                    let mut stream = connector
                        .connect(server_name, tcp)
                        .await
                        .map_err(|e| AdapterError::unreachable(e.to_string()))?;
                    stream.write_all(envelope.as_bytes()).await?;
                    stream.shutdown().await?;
                    let mut reply = Vec::new();
                    stream.read_to_end(&mut reply).await?;
                    Ok(reply)
                }
            }
        })
        .await
        .map_err(|_| AdapterError::unreachable("scanner command timed out"))??;

        String::from_utf8(reply).map_err(|e| AdapterError::protocol(e.to_string()))
    }
}

fn build_tls_config(endpoint: &OspEndpoint) -> Result<ClientConfig, AdapterError> {
    static CRYPTO_PROVIDER_INIT: std::sync::Once = std::sync::Once::new();
    CRYPTO_PROVIDER_INIT.call_once(|| {
        let _ = tokio_rustls::rustls::crypto::aws_lc_rs::default_provider().install_default();
    });

    let mut roots = RootCertStore::empty();
    if let Some(ca_pem) = &endpoint.ca_cert {
        for cert in rustls_pemfile::certs(&mut ca_pem.as_bytes()) {
            let cert = cert.map_err(|e| AdapterError::Tls(e.to_string()))?;
            roots
                .add(cert)
                .map_err(|e| AdapterError::Tls(e.to_string()))?;
        }
    }
    let builder = ClientConfig::builder().with_root_certificates(roots);

    match (&endpoint.client_cert, &endpoint.client_key) {
        (Some(cert_pem), Some(key_pem)) => {
            let certs = rustls_pemfile::certs(&mut cert_pem.as_bytes())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| AdapterError::Tls(e.to_string()))?;
            let key = rustls_pemfile::private_key(&mut key_pem.as_bytes())
                .map_err(|e| AdapterError::Tls(e.to_string()))?
                .ok_or_else(|| AdapterError::Tls("no private key in PEM".to_string()))?;
            builder
                .with_client_auth_cert(certs, key)
                .map_err(|e| AdapterError::Tls(e.to_string()))
        }
        _ => Ok(builder.with_no_client_auth()),
    }
}

#[async_trait]
impl OspSession for TlsOspSession {
    async fn start_scan(&self, spec: &OspScanSpec) -> Result<String, AdapterError> {
        let reply = self.exchange(&build_start_scan(spec)).await?;
        parse_start_scan_reply(&reply)
    }

    async fn get_scan(&self, scan_id: &str) -> Result<OspScanStatus, AdapterError> {
        let reply = self.exchange(&build_get_scans(scan_id)).await?;
        parse_scan_reply(&reply)
    }

    async fn stop_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        let reply = self.exchange(&build_stop_scan(scan_id)).await?;
        parse_ack_reply(&reply, "stop_scan")
    }

    async fn delete_scan(&self, scan_id: &str) -> Result<(), AdapterError> {
        let reply = self.exchange(&build_delete_scan(scan_id)).await?;
        parse_ack_reply(&reply, "delete_scan")
    }

    async fn get_vts(&self) -> Result<Vec<VtMeta>, AdapterError> {
        let reply = self.exchange("<get_vts/>").await?;
        parse_vts_reply(&reply)
    }

    async fn check_feed(&self) -> Result<OspFeedStatus, AdapterError> {
        let reply = self.exchange("<check_feed/>").await?;
        parse_feed_reply(&reply)
    }

    async fn get_performance(
        &self,
        start: i64,
        end: i64,
        titles: &str,
    ) -> Result<String, AdapterError> {
        let reply = self
            .exchange(&build_get_performance(start, end, titles))
            .await?;
        parse_performance_reply(&reply)
    }
}

#[cfg(test)]
#[path = "osp_tests.rs"]
mod tests;
