//! Builders constructing schedulers and primitives from registrations and configuration.

pub mod scheduler_builder;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::SchedulerError;
use crate::poller::Poller;
use crate::rate_limiter::RateLimiter;

pub use scheduler_builder::SchedulerBuilder;

/// Build every named rate limiter in the configuration.
///
/// Limiters are shared, so each is wrapped in an `Arc` for the tasks that
/// call the same downstream API.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidOptions`] naming the first invalid limiter.
pub fn build_rate_limiters(
    cfg: &SchedulerConfig,
) -> Result<HashMap<String, Arc<RateLimiter>>, SchedulerError> {
    let mut limiters = HashMap::new();
    for (name, limiter_cfg) in &cfg.rate_limiters {
        limiter_cfg
            .validate()
            .map_err(|e| SchedulerError::InvalidOptions(format!("rate limiter `{name}`: {e}")))?;
        limiters.insert(name.clone(), Arc::new(RateLimiter::from_config(limiter_cfg)?));
    }
    Ok(limiters)
}

/// Build the poller described by the configuration.
///
/// # Errors
///
/// Returns [`SchedulerError::InvalidOptions`] if the poller section is invalid.
pub fn build_poller(cfg: &SchedulerConfig) -> Result<Poller, SchedulerError> {
    Poller::from_config(&cfg.poller)
}
