// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SecInfo records consumed by the CVE correlation scanner.

use serde::{Deserialize, Serialize};

/// One CVE advisory as stored in the SCAP tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CveEntry {
    /// CVE identifier, e.g. `CVE-2023-0001`.
    pub cve: String,
    pub severity: f64,
    pub description: String,
}

/// CPE applicability tree of a CVE (matching-version 1 data).
///
/// Leaves name a CPE; inner nodes combine children with AND/OR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpeMatchNode {
    Cpe(String),
    And(Vec<CpeMatchNode>),
    Or(Vec<CpeMatchNode>),
}

impl CpeMatchNode {
    /// Evaluate the tree against the set of CPEs found on a host.
    pub fn matches(&self, host_cpes: &[String]) -> bool {
        match self {
            CpeMatchNode::Cpe(cpe) => host_cpes.iter().any(|c| c == cpe),
            CpeMatchNode::And(children) => children.iter().all(|n| n.matches(host_cpes)),
            CpeMatchNode::Or(children) => children.iter().any(|n| n.matches(host_cpes)),
        }
    }

    /// All CPE leaves in the tree, used for candidate indexing.
    pub fn cpes(&self) -> Vec<&str> {
        match self {
            CpeMatchNode::Cpe(cpe) => vec![cpe.as_str()],
            CpeMatchNode::And(children) | CpeMatchNode::Or(children) => {
                children.iter().flat_map(|n| n.cpes()).collect()
            }
        }
    }
}

#[cfg(test)]
#[path = "secinfo_tests.rs"]
mod tests;
