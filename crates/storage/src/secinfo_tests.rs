// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn cpes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn leaf_matches_exact_cpe() {
    let node = CpeMatchNode::Cpe("cpe:/a:example:foo:1.2.3".to_string());
    assert!(node.matches(&cpes(&["cpe:/a:example:foo:1.2.3"])));
    assert!(!node.matches(&cpes(&["cpe:/a:example:foo:1.2.4"])));
}

#[test]
fn and_requires_all_children() {
    let node = CpeMatchNode::And(vec![
        CpeMatchNode::Cpe("cpe:/a:example:foo:1.2.3".to_string()),
        CpeMatchNode::Cpe("cpe:/o:example:os:9".to_string()),
    ]);
    assert!(node.matches(&cpes(&[
        "cpe:/a:example:foo:1.2.3",
        "cpe:/o:example:os:9"
    ])));
    assert!(!node.matches(&cpes(&["cpe:/a:example:foo:1.2.3"])));
}

#[test]
fn or_requires_any_child() {
    let node = CpeMatchNode::Or(vec![
        CpeMatchNode::Cpe("cpe:/a:example:foo:1.0".to_string()),
        CpeMatchNode::Cpe("cpe:/a:example:foo:1.1".to_string()),
    ]);
    assert!(node.matches(&cpes(&["cpe:/a:example:foo:1.1"])));
    assert!(!node.matches(&cpes(&["cpe:/a:example:foo:2.0"])));
}

#[test]
fn nested_tree_evaluation() {
    // (foo:1.2.3 AND (os:9 OR os:10))
    let node = CpeMatchNode::And(vec![
        CpeMatchNode::Cpe("cpe:/a:example:foo:1.2.3".to_string()),
        CpeMatchNode::Or(vec![
            CpeMatchNode::Cpe("cpe:/o:example:os:9".to_string()),
            CpeMatchNode::Cpe("cpe:/o:example:os:10".to_string()),
        ]),
    ]);
    assert!(node.matches(&cpes(&[
        "cpe:/a:example:foo:1.2.3",
        "cpe:/o:example:os:10"
    ])));
    assert!(!node.matches(&cpes(&["cpe:/o:example:os:10"])));
}

#[test]
fn cpes_lists_all_leaves() {
    let node = CpeMatchNode::Or(vec![
        CpeMatchNode::Cpe("a".to_string()),
        CpeMatchNode::And(vec![
            CpeMatchNode::Cpe("b".to_string()),
            CpeMatchNode::Cpe("c".to_string()),
        ]),
    ]);
    assert_eq!(node.cpes(), vec!["a", "b", "c"]);
}
