// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scan targets and agent groups.

use crate::acl::UserId;
use crate::credential::{CredentialId, CredentialProtocol};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

crate::define_id! {
    /// Unique identifier for a target.
    pub struct TargetId;
}

crate::define_id! {
    /// Unique identifier for an agent group.
    pub struct AgentGroupId;
}

/// Alive-test method bitmask.
///
/// Bit values are part of the scanner wire contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AliveTests(pub u32);

impl AliveTests {
    pub const SCAN_CONFIG_DEFAULT: AliveTests = AliveTests(0);
    pub const TCP_ACK_SERVICE: AliveTests = AliveTests(1);
    pub const ICMP: AliveTests = AliveTests(2);
    pub const ARP: AliveTests = AliveTests(4);
    pub const CONSIDER_ALIVE: AliveTests = AliveTests(8);
    pub const TCP_SYN_SERVICE: AliveTests = AliveTests(16);

    pub fn contains(&self, other: AliveTests) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(&self, other: AliveTests) -> AliveTests {
        AliveTests(self.0 | other.0)
    }
}

/// Declarative description of what to scan.
///
/// Immutable with respect to a running scan: workers read the target once
/// at scan start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: TargetId,
    pub name: String,
    pub owner: UserId,
    /// Comma-separated hosts specification.
    pub hosts: String,
    #[serde(default)]
    pub exclude_hosts: String,
    /// Port range specification, e.g. `T:1-1024,U:53`.
    #[serde(default)]
    pub port_range: String,
    #[serde(default)]
    pub alive_tests: AliveTests,
    #[serde(default)]
    pub reverse_lookup_only: bool,
    #[serde(default)]
    pub reverse_lookup_unify: bool,
    /// Credentials to use, by protocol.
    #[serde(default)]
    pub credentials: BTreeMap<CredentialProtocol, CredentialId>,
}

impl Target {
    pub fn new(
        id: impl Into<TargetId>,
        name: impl Into<String>,
        owner: impl Into<UserId>,
        hosts: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner: owner.into(),
            hosts: hosts.into(),
            exclude_hosts: String::new(),
            port_range: String::new(),
            alive_tests: AliveTests::default(),
            reverse_lookup_only: false,
            reverse_lookup_unify: false,
            credentials: BTreeMap::new(),
        }
    }

    /// Expand the hosts specification into individual entries, honouring
    /// the exclude list. Entries are comma- or whitespace-separated;
    /// duplicates collapse keeping first occurrence order.
    pub fn expand_hosts(&self) -> Vec<String> {
        let excluded: Vec<String> = split_hosts(&self.exclude_hosts);
        let mut seen = std::collections::HashSet::new();
        split_hosts(&self.hosts)
            .into_iter()
            .filter(|h| !excluded.contains(h))
            .filter(|h| seen.insert(h.clone()))
            .collect()
    }
}

fn split_hosts(spec: &str) -> Vec<String> {
    spec.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A named set of deployed agents addressed by an agent-controller scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentGroup {
    pub id: AgentGroupId,
    pub name: String,
    pub owner: UserId,
    /// Agent identifiers as known to the agent controller.
    pub agents: Vec<String>,
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod tests;
