//! # Env Reaper
//!
//! Dependency-aware scheduling for tearing down the cloud resources of expired
//! environments.
//!
//! Resources reference one another: a database instance references a subnet
//! group, a subnet references a network. Deleting them in the wrong order
//! fails, and deleting them one at a time is slow. This crate orders an
//! arbitrary batch of asynchronous "destroy" tasks by a category-level
//! dependency table, runs independent environments in parallel, bounds the
//! number of outstanding calls, and reports which tasks failed.
//!
//! ## Components
//!
//! - **`SchedulerBuilder` / `Scheduler`**: tasks are registered with a
//!   partition (environment), a category (resource type) and a sort key. The
//!   builder resolves the dependency table into a wait/notify plan; the
//!   scheduler runs it once under a global concurrency bound.
//! - **`RateLimiter`**: a token bucket bounding calls to a throttled API.
//! - **`Poller`**: waits at a fixed interval for a remote resource to reach a
//!   target state, with an optional deadline.
//!
//! ## Ordering
//!
//! A category that depends on another is destroyed first: with
//! `{"rds.db": ["rds.subgrp"]}` every `rds.db` task in an environment settles
//! before any `rds.subgrp` task in that environment starts. Constraints never
//! cross environments.
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use env_reaper::config::ExecuteOptions;
//! use env_reaper::core::{SchedulerBuilder, TaskParams};
//!
//! # async fn run() -> Result<(), env_reaper::core::SchedulerError> {
//! let deps = HashMap::from([("rds.db".to_string(), vec!["rds.subgrp".to_string()])]);
//! let mut builder = SchedulerBuilder::new(deps);
//! builder.add_task(
//!     || async { /* delete db instance */ Ok(()) },
//!     TaskParams::new().partition("pr-1412").category("rds.db").sort_key("db-1"),
//! );
//! builder.add_task(
//!     || async { /* delete subnet group */ Ok(()) },
//!     TaskParams::new().partition("pr-1412").category("rds.subgrp"),
//! );
//!
//! let report = builder.build()?.execute(ExecuteOptions::new(20)).await?;
//! for failure in report.failures() {
//!     eprintln!("{} failed: {:?}", failure.group, failure.status);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Failed tasks never make `execute` return an error; the returned
//! [`ExecutionReport`](crate::core::ExecutionReport) lists them, and
//! [`into_result`](crate::core::ExecutionReport::into_result) converts them into one
//! error after the run has settled.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: tasks, plans, execution and reporting.
pub mod core;
/// Configuration models for runs, primitives and dependency tables.
pub mod config;
/// Builders to construct schedulers and primitives.
pub mod builders;
/// Runtime adapters for spawning tasks.
pub mod runtime;
/// Shared utilities.
pub mod util;
/// Token bucket rate limiter.
pub mod rate_limiter;
/// Fixed-interval poller with optional deadline.
pub mod poller;

pub use poller::{PollOptions, Poller};
pub use rate_limiter::RateLimiter;
