// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay discovery via the external mapper executable.
//!
//! Sensors sit behind relays; an optional mapper program translates a
//! scanner's `(host, port, ca)` into the relay endpoint that actually
//! answers. No mapper configured means the identity mapping.

use crate::subprocess::{run_with_timeout, RELAY_MAPPER_TIMEOUT};
use crate::AdapterError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::path::Path;
use tokio::process::Command;

/// Protocol argument handed to the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayProtocol {
    Gmp,
    Osp,
}

impl RelayProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelayProtocol::Gmp => "GMP",
            RelayProtocol::Osp => "OSP",
        }
    }
}

/// A resolved relay endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayEndpoint {
    pub host: String,
    pub port: u16,
    pub ca_cert: Option<String>,
}

/// Parse the mapper's `<relay>` reply.
///
/// An empty host or port element means "no relay found".
pub fn parse_relay_reply(xml: &str) -> Result<Option<RelayEndpoint>, AdapterError> {
    let mut reader = Reader::from_str(xml);
    let mut element = Vec::new();
    let mut host = String::new();
    let mut port = String::new();
    let mut ca_cert = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => element = e.local_name().as_ref().to_vec(),
            Ok(Event::End(_)) => element.clear(),
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| AdapterError::protocol(e.to_string()))?;
                match element.as_slice() {
                    b"host" => host.push_str(text.trim()),
                    b"port" => port.push_str(text.trim()),
                    b"ca_cert" => ca_cert.push_str(&text),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AdapterError::protocol(e.to_string())),
            _ => {}
        }
    }

    if host.is_empty() || port.is_empty() {
        return Ok(None);
    }
    let port: u16 = port
        .parse()
        .map_err(|_| AdapterError::protocol(format!("relay port not numeric: {port}")))?;
    Ok(Some(RelayEndpoint {
        host,
        port,
        ca_cert: (!ca_cert.trim().is_empty()).then(|| ca_cert.trim().to_string()),
    }))
}

/// Run the mapper and parse its reply.
pub async fn resolve_with_mapper(
    mapper: &Path,
    host: &str,
    port: u16,
    protocol: RelayProtocol,
) -> Result<Option<RelayEndpoint>, AdapterError> {
    let mut cmd = Command::new(mapper);
    cmd.arg("--host")
        .arg(host)
        .arg("--port")
        .arg(port.to_string())
        .arg("--protocol")
        .arg(protocol.as_str());

    let output = run_with_timeout(cmd, RELAY_MAPPER_TIMEOUT, "relay mapper")
        .await
        .map_err(AdapterError::Helper)?;

    if !output.status.success() {
        return Err(AdapterError::Helper(format!(
            "relay mapper exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let xml = String::from_utf8_lossy(&output.stdout);
    parse_relay_reply(&xml)
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
