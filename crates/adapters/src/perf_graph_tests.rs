// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;

fn write_helper(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    let helper = dir.join("gvmcg");
    {
        let mut f = std::fs::File::create(&helper).unwrap();
        writeln!(f, "#!/bin/sh").unwrap();
        writeln!(f, "{body}").unwrap();
    }
    let mut perms = std::fs::metadata(&helper).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&helper, perms).unwrap();
    helper
}

#[test]
fn titles_parse_name_and_title() {
    let titles = parse_titles("cpu-0 CPU Usage\nmem Memory\n\nbad_line_without_space\n");
    assert_eq!(titles.len(), 2);
    assert_eq!(titles[0].name, "cpu-0");
    assert_eq!(titles[0].title, "CPU Usage");
    assert_eq!(titles[1].title, "Memory");
}

#[tokio::test]
async fn successful_helper_yields_graph() {
    let dir = tempfile::tempdir().unwrap();
    let helper = write_helper(dir.path(), "echo 'iVBORw0KGgo='");
    let report = performance_graph(&helper, 0, 3600, "cpu-0").await;
    assert_eq!(report, PerfReport::Graph("iVBORw0KGgo=\n".to_string()));
}

#[tokio::test]
async fn failing_helper_falls_back_to_text() {
    let dir = tempfile::tempdir().unwrap();
    let helper = write_helper(dir.path(), "exit 1");
    let report = performance_graph(&helper, 0, 3600, "cpu-0").await;
    assert!(matches!(report, PerfReport::Fallback(_)));
}

#[tokio::test]
async fn missing_helper_falls_back_to_text() {
    let report =
        performance_graph(std::path::Path::new("/nonexistent/gvmcg"), 0, 3600, "cpu-0").await;
    assert!(matches!(report, PerfReport::Fallback(_)));
}

#[tokio::test]
async fn titles_listing_runs_helper() {
    let dir = tempfile::tempdir().unwrap();
    let helper = write_helper(dir.path(), "echo 'load System Load'");
    let titles = performance_titles(&helper).await;
    assert_eq!(titles.len(), 1);
    assert_eq!(titles[0].name, "load");
}
