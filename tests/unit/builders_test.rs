//! Tests for builder modules

use std::collections::HashMap;
use std::time::Duration;

use env_reaper::builders::{build_poller, build_rate_limiters, SchedulerBuilder};
use env_reaper::config::{PollerConfig, RateLimiterConfig, SchedulerConfig};
use env_reaper::core::{GroupKey, SchedulerError, TaskParams};

fn noop_params(partition: &str, category: &str) -> TaskParams {
    TaskParams::new().partition(partition).category(category)
}

#[test]
fn test_scheduler_builder_counts_tasks() {
    let mut builder = SchedulerBuilder::default();
    let first = builder.add_task(|| async { Ok(()) }, noop_params("env1", "db"));
    let second = builder.add_task(|| async { Ok(()) }, noop_params("env1", "db"));
    assert_eq!((first, second), (1, 2));
    assert_eq!(builder.task_count(), 2);

    let scheduler = builder.build().unwrap();
    assert_eq!(scheduler.task_count(), 2);
    assert_eq!(scheduler.group_count(), 1);
}

#[test]
fn test_scheduler_builder_plan_edges() {
    let deps = HashMap::from([
        ("db".to_string(), vec!["subgrp".to_string()]),
        ("subgrp".to_string(), vec!["subnet".to_string()]),
    ]);
    let mut builder = SchedulerBuilder::new(deps);
    builder.add_task(|| async { Ok(()) }, noop_params("env1", "subnet"));
    builder.add_task(|| async { Ok(()) }, noop_params("env1", "db"));
    builder.add_task(|| async { Ok(()) }, noop_params("env2", "subnet"));
    let scheduler = builder.build().unwrap();

    let db = GroupKey::new(Some("env1"), Some("db"));
    let subnet = GroupKey::new(Some("env1"), Some("subnet"));
    // subgrp has no tasks, so db releases subnet directly.
    assert_eq!(scheduler.notify_targets(&db), Some(vec![subnet.clone()]));
    assert_eq!(scheduler.waiting_on(&subnet), Some(vec![db.clone()]));
    assert_eq!(
        scheduler.waiting_on(&GroupKey::new(Some("env2"), Some("subnet"))),
        Some(vec![])
    );
    assert_eq!(scheduler.waiting_on(&GroupKey::new(Some("env3"), Some("db"))), None);
    assert_eq!(
        scheduler.initial_groups(),
        vec![db, GroupKey::new(Some("env2"), Some("subnet"))]
    );
}

#[test]
fn test_scheduler_builder_from_config() {
    let cfg = SchedulerConfig::from_json_str(
        r#"{ "dependencies": { "a": ["b"], "b": ["a"] } }"#,
    )
    .unwrap();
    let mut builder = SchedulerBuilder::from_config(&cfg).with_cycle_detection(true);
    builder.add_task(|| async { Ok(()) }, noop_params("env1", "a"));

    match builder.build() {
        Err(SchedulerError::DependencyCycle(path)) => {
            assert_eq!(path.first(), path.last());
            assert!(path.len() >= 3);
        }
        other => panic!("expected a cycle error, got {:?}", other.err()),
    }
}

#[test]
fn test_build_rate_limiters() {
    let mut cfg = SchedulerConfig::default();
    cfg.rate_limiters.insert("iam".to_string(), RateLimiterConfig::new(1000));
    cfg.rate_limiters.insert(
        "ec2".to_string(),
        RateLimiterConfig {
            max_tokens: 5,
            initial_tokens: Some(2),
            window_ms: 1000,
            fill_rate: 5,
        },
    );

    let limiters = build_rate_limiters(&cfg).unwrap();
    assert_eq!(limiters.len(), 2);
    assert_eq!(limiters["iam"].max_tokens(), 1);
    assert_eq!(limiters["ec2"].max_tokens(), 5);
}

#[test]
fn test_build_rate_limiters_names_invalid_entry() {
    let mut cfg = SchedulerConfig::default();
    cfg.rate_limiters.insert("rds".to_string(), RateLimiterConfig::new(0));

    match build_rate_limiters(&cfg) {
        Err(SchedulerError::InvalidOptions(msg)) => {
            assert_eq!(msg, "rate limiter `rds`: window_ms must be greater than 0");
        }
        other => panic!("expected invalid options, got {:?}", other.map(|m| m.len())),
    }
}

#[test]
fn test_build_poller() {
    let mut cfg = SchedulerConfig::default();
    cfg.poller = PollerConfig {
        interval_ms: 250,
        timeout_ms: Some(5_000),
    };
    let poller = build_poller(&cfg).unwrap();
    assert_eq!(poller.interval(), Duration::from_millis(250));
    assert_eq!(poller.timeout(), Some(Duration::from_secs(5)));

    cfg.poller.interval_ms = 0;
    assert!(matches!(build_poller(&cfg), Err(SchedulerError::InvalidOptions(_))));
}
