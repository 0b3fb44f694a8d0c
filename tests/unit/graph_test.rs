//! Tests for the category dependency graph and key ordering

use std::cmp::Ordering;
use std::collections::HashMap;

use env_reaper::core::{compare_numeric_str, CategoryDependencies, CategoryGraph, GroupKey};

fn table(pairs: &[(&str, &[&str])]) -> CategoryDependencies {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), v.iter().map(|s| (*s).to_string()).collect()))
        .collect()
}

#[test]
fn test_graph_interns_keys_and_targets() {
    let graph = CategoryGraph::new(&table(&[("rds.db", &["rds.subgrp", "ec2.sg"])]));
    assert_eq!(graph.len(), 3);
    assert!(graph.index_of("ec2.sg").is_some());
    assert!(graph.index_of("s3.bucket").is_none());

    let idx = graph.index_of("rds.subgrp").unwrap();
    assert_eq!(graph.name(idx), "rds.subgrp");
}

#[test]
fn test_closure_is_transitive() {
    let graph = CategoryGraph::new(&table(&[
        ("rds.db", &["rds.subgrp"]),
        ("rds.subgrp", &["ec2.subnet"]),
        ("ec2.subnet", &["ec2.vpc"]),
    ]));
    let start = graph.index_of("rds.db").unwrap();
    let mut reached: Vec<&str> = graph.closure(start).into_iter().map(|i| graph.name(i)).collect();
    reached.sort_unstable();
    assert_eq!(reached, vec!["ec2.subnet", "ec2.vpc", "rds.subgrp"]);

    let leaf = graph.index_of("ec2.vpc").unwrap();
    assert!(graph.closure(leaf).is_empty());
}

#[test]
fn test_closure_includes_start_only_through_cycle() {
    let graph = CategoryGraph::new(&table(&[("a", &["b"]), ("b", &["a"])]));
    let a = graph.index_of("a").unwrap();
    assert!(graph.closure(a).contains(&a));
    assert!(graph.find_cycle().is_some());
}

#[test]
fn test_acyclic_graph_has_no_cycle() {
    let graph = CategoryGraph::new(&table(&[("a", &["b", "c"]), ("b", &["c"])]));
    assert!(graph.find_cycle().is_none());
    assert!(CategoryGraph::new(&HashMap::new()).is_empty());
}

#[test]
fn test_numeric_run_comparison() {
    assert_eq!(compare_numeric_str("env2", "env10"), Ordering::Less);
    assert_eq!(compare_numeric_str("pr-100", "pr-99"), Ordering::Greater);
    assert_eq!(compare_numeric_str("abc", "abd"), Ordering::Less);
}

#[test]
fn test_group_key_display_and_order() {
    let full = GroupKey::new(Some("env1"), Some("rds.db"));
    assert_eq!(full.to_string(), "env1:rds.db");
    assert_eq!(GroupKey::new(Some("env1"), None).to_string(), "env1");
    assert_eq!(GroupKey::new(None, Some("rds.db")).to_string(), "rds.db");
    assert_eq!(GroupKey::new(None, None).to_string(), "");

    let mut keys = vec![
        GroupKey::new(Some("env10"), Some("a")),
        GroupKey::new(Some("env2"), Some("b")),
        GroupKey::new(Some("env2"), Some("a")),
    ];
    keys.sort();
    assert_eq!(
        keys,
        vec![
            GroupKey::new(Some("env2"), Some("a")),
            GroupKey::new(Some("env2"), Some("b")),
            GroupKey::new(Some("env10"), Some("a")),
        ]
    );
}
