//! Configuration models for runs, primitives and dependency tables.

pub mod scheduler;

pub use scheduler::{ExecuteOptions, PollerConfig, RateLimiterConfig, SchedulerConfig};
