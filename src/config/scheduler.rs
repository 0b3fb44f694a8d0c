//! Scheduler, poller and rate limiter configuration structures.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::CategoryDependencies;

/// Options for one [`Scheduler::execute`](crate::core::Scheduler::execute) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteOptions {
    /// Maximum number of tasks in flight across all groups.
    pub maximum_concurrency: usize,
    /// Keep scheduling after a task fails instead of aborting the run.
    pub continue_after_errors: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            maximum_concurrency: 20,
            continue_after_errors: false,
        }
    }
}

impl ExecuteOptions {
    /// Options with the given concurrency bound and abort-on-failure.
    #[must_use]
    pub fn new(maximum_concurrency: usize) -> Self {
        Self {
            maximum_concurrency,
            ..Self::default()
        }
    }

    /// Set whether failures abort the run.
    #[must_use]
    pub const fn with_continue_after_errors(mut self, continue_after_errors: bool) -> Self {
        self.continue_after_errors = continue_after_errors;
        self
    }

    /// Validate option values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.maximum_concurrency == 0 {
            return Err("maximum_concurrency must be greater than 0".into());
        }
        Ok(())
    }
}

/// Poller cadence and deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Delay between predicate evaluations, in milliseconds.
    pub interval_ms: u64,
    /// Give up after this many milliseconds; `None` waits forever.
    pub timeout_ms: Option<u64>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            timeout_ms: None,
        }
    }
}

impl PollerConfig {
    /// Validate poller configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.interval_ms == 0 {
            return Err("interval_ms must be greater than 0".into());
        }
        Ok(())
    }
}

/// Token bucket parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Bucket capacity.
    #[serde(default = "default_tokens")]
    pub max_tokens: u32,
    /// Tokens available at construction; defaults to `max_tokens`.
    #[serde(default)]
    pub initial_tokens: Option<u32>,
    /// Refill window in milliseconds.
    pub window_ms: u64,
    /// Tokens granted per window.
    #[serde(default = "default_tokens")]
    pub fill_rate: u32,
}

const fn default_tokens() -> u32 {
    1
}

impl RateLimiterConfig {
    /// One token per `window_ms`, bucket of one.
    #[must_use]
    pub const fn new(window_ms: u64) -> Self {
        Self {
            max_tokens: 1,
            initial_tokens: None,
            window_ms,
            fill_rate: 1,
        }
    }

    /// Validate rate limiter configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".into());
        }
        if self.window_ms == 0 {
            return Err("window_ms must be greater than 0".into());
        }
        if self.fill_rate == 0 {
            return Err("fill_rate must be greater than 0".into());
        }
        if let Some(initial) = self.initial_tokens {
            if initial > self.max_tokens {
                return Err(format!(
                    "initial_tokens ({initial}) exceeds max_tokens ({})",
                    self.max_tokens
                ));
            }
        }
        Ok(())
    }
}

/// Root scheduler configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Options passed to each run.
    pub execution: ExecuteOptions,
    /// Poller used by tasks waiting on remote state.
    pub poller: PollerConfig,
    /// Named rate limiters, typically one per downstream API.
    pub rate_limiters: HashMap<String, RateLimiterConfig>,
    /// Category dependency table.
    pub dependencies: CategoryDependencies,
}

impl SchedulerConfig {
    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        self.execution
            .validate()
            .map_err(|e| format!("execution invalid: {e}"))?;
        self.poller
            .validate()
            .map_err(|e| format!("poller invalid: {e}"))?;
        for (name, limiter) in &self.rate_limiters {
            limiter
                .validate()
                .map_err(|e| format!("rate limiter `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults overridden by environment variables, after loading `.env`
    /// if present.
    ///
    /// Recognized variables: `MAXIMUM_CONCURRENCY`, `CONTINUE_AFTER_ERRORS`,
    /// `POLL_INTERVAL_MS`, `POLL_TIMEOUT_MS`.
    ///
    /// # Errors
    ///
    /// Returns a message naming the variable that failed to parse or validate.
    pub fn from_env() -> Result<Self, String> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(format!("failed to load .env: {e}"));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`, keyed like environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Returns a message naming the key that failed to parse or validate.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = parse_var::<usize>(&lookup, "MAXIMUM_CONCURRENCY")? {
            cfg.execution.maximum_concurrency = v;
        }
        if let Some(v) = parse_bool(&lookup, "CONTINUE_AFTER_ERRORS")? {
            cfg.execution.continue_after_errors = v;
        }
        if let Some(v) = parse_var::<u64>(&lookup, "POLL_INTERVAL_MS")? {
            cfg.poller.interval_ms = v;
        }
        if let Some(v) = parse_var::<u64>(&lookup, "POLL_TIMEOUT_MS")? {
            cfg.poller.timeout_ms = Some(v);
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| format!("{key}: {e}"))
        })
        .transpose()
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<bool>, String> {
    lookup(key)
        .map(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(format!("{key}: expected a boolean, got `{other}`")),
        })
        .transpose()
}
