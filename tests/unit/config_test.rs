//! Tests for configuration validation

use std::collections::HashMap;

use env_reaper::config::{ExecuteOptions, PollerConfig, RateLimiterConfig, SchedulerConfig};

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_execute_options_defaults() {
    let options = ExecuteOptions::default();
    assert_eq!(options.maximum_concurrency, 20);
    assert!(!options.continue_after_errors);
    assert!(options.validate().is_ok());
}

#[test]
fn test_execute_options_invalid_concurrency() {
    assert!(ExecuteOptions::new(0).validate().is_err());
    assert!(ExecuteOptions::new(1).with_continue_after_errors(true).validate().is_ok());
}

#[test]
fn test_poller_config_validation() {
    assert_eq!(PollerConfig::default().interval_ms, 10_000);
    assert!(PollerConfig::default().validate().is_ok());
    let invalid = PollerConfig {
        interval_ms: 0,
        timeout_ms: None,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_rate_limiter_config_validation() {
    assert!(RateLimiterConfig::new(1000).validate().is_ok());
    assert!(RateLimiterConfig::new(0).validate().is_err());

    let too_many = RateLimiterConfig {
        max_tokens: 2,
        initial_tokens: Some(3),
        window_ms: 1000,
        fill_rate: 1,
    };
    assert!(too_many.validate().is_err());

    let no_fill = RateLimiterConfig {
        fill_rate: 0,
        ..RateLimiterConfig::new(1000)
    };
    assert!(no_fill.validate().is_err());
}

#[test]
fn test_scheduler_config_from_json() {
    let cfg = SchedulerConfig::from_json_str(
        r#"{
            "execution": { "maximum_concurrency": 5, "continue_after_errors": true },
            "poller": { "interval_ms": 500 },
            "rate_limiters": { "iam": { "window_ms": 1000 } },
            "dependencies": { "rds.db": ["rds.subgrp"] }
        }"#,
    )
    .unwrap();

    assert_eq!(cfg.execution.maximum_concurrency, 5);
    assert!(cfg.execution.continue_after_errors);
    assert_eq!(cfg.poller.interval_ms, 500);
    assert_eq!(cfg.poller.timeout_ms, None);
    assert_eq!(cfg.rate_limiters["iam"], RateLimiterConfig::new(1000));
    assert_eq!(cfg.dependencies["rds.db"], vec!["rds.subgrp".to_string()]);
}

#[test]
fn test_scheduler_config_rejects_invalid_json() {
    let err = SchedulerConfig::from_json_str(r#"{ "execution": { "maximum_concurrency": 0 } }"#)
        .unwrap_err();
    assert!(err.starts_with("execution invalid"));

    let err = SchedulerConfig::from_json_str("not json").unwrap_err();
    assert!(err.starts_with("parse error"));

    let err = SchedulerConfig::from_json_str(r#"{ "rate_limiters": { "ec2": { "window_ms": 0 } } }"#)
        .unwrap_err();
    assert_eq!(err, "rate limiter `ec2` invalid: window_ms must be greater than 0");
}

#[test]
fn test_scheduler_config_from_lookup() {
    let cfg = SchedulerConfig::from_lookup(lookup(&[
        ("MAXIMUM_CONCURRENCY", "8"),
        ("CONTINUE_AFTER_ERRORS", "yes"),
        ("POLL_INTERVAL_MS", " 250 "),
        ("POLL_TIMEOUT_MS", "60000"),
    ]))
    .unwrap();

    assert_eq!(cfg.execution.maximum_concurrency, 8);
    assert!(cfg.execution.continue_after_errors);
    assert_eq!(cfg.poller.interval_ms, 250);
    assert_eq!(cfg.poller.timeout_ms, Some(60_000));
}

#[test]
fn test_scheduler_config_from_empty_lookup_is_default() {
    let cfg = SchedulerConfig::from_lookup(|_| None).unwrap();
    assert_eq!(cfg, SchedulerConfig::default());
}

#[test]
fn test_scheduler_config_lookup_errors_name_the_key() {
    let err = SchedulerConfig::from_lookup(lookup(&[("MAXIMUM_CONCURRENCY", "many")])).unwrap_err();
    assert!(err.starts_with("MAXIMUM_CONCURRENCY"));

    let err = SchedulerConfig::from_lookup(lookup(&[("CONTINUE_AFTER_ERRORS", "maybe")])).unwrap_err();
    assert_eq!(err, "CONTINUE_AFTER_ERRORS: expected a boolean, got `maybe`");

    let err = SchedulerConfig::from_lookup(lookup(&[("MAXIMUM_CONCURRENCY", "0")])).unwrap_err();
    assert!(err.starts_with("execution invalid"));
}
