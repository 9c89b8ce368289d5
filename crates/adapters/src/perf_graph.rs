// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Performance-graph generation via the external `gvmcg` helper.

use crate::subprocess::{run_with_timeout, PERF_GRAPH_TIMEOUT};
use std::path::Path;
use tokio::process::Command;

/// Outcome of a performance report request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PerfReport {
    /// Graph data as emitted by the helper (optionally base64).
    Graph(String),
    /// Static textual fallback when the helper is unavailable or fails.
    Fallback(String),
}

/// One line of `gvmcg 0 titles` output: `<name> <title>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfTitle {
    pub name: String,
    pub title: String,
}

/// Parse the title listing emitted by `gvmcg 0 titles`.
pub fn parse_titles(stdout: &str) -> Vec<PerfTitle> {
    stdout
        .lines()
        .filter_map(|line| {
            let line = line.trim_end();
            let (name, title) = line.split_once(' ')?;
            if name.is_empty() {
                return None;
            }
            Some(PerfTitle {
                name: name.to_string(),
                title: title.trim().to_string(),
            })
        })
        .collect()
}

fn fallback(reason: &str) -> PerfReport {
    PerfReport::Fallback(format!(
        "Performance graphs are unavailable: {reason}. \
         Install the graph generator to enable system reports."
    ))
}

/// Generate one performance graph for `[start, end]`.
///
/// A missing or failing helper degrades to a textual report rather than
/// an error.
pub async fn performance_graph(
    helper: &Path,
    start: i64,
    end: i64,
    title: &str,
) -> PerfReport {
    let mut cmd = Command::new(helper);
    cmd.arg(start.to_string())
        .arg(end.to_string())
        .arg(title);

    match run_with_timeout(cmd, PERF_GRAPH_TIMEOUT, "performance graph helper").await {
        Ok(output) if output.status.success() => {
            PerfReport::Graph(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = ?output.status.code(), stderr = %stderr, "graph helper failed");
            fallback("the helper exited with an error")
        }
        Err(reason) => {
            tracing::warn!(reason, "graph helper did not run");
            fallback(&reason)
        }
    }
}

/// List available performance report titles (`gvmcg 0 titles`).
pub async fn performance_titles(helper: &Path) -> Vec<PerfTitle> {
    let mut cmd = Command::new(helper);
    cmd.arg("0").arg("titles");
    match run_with_timeout(cmd, PERF_GRAPH_TIMEOUT, "performance title listing").await {
        Ok(output) if output.status.success() => {
            parse_titles(&String::from_utf8_lossy(&output.stdout))
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
#[path = "perf_graph_tests.rs"]
mod tests;
