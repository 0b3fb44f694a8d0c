//! Error types for scheduler operations.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by scheduler components.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Execution or primitive options failed validation.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    /// The category dependency table contains a cycle.
    #[error("dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),
    /// No async runtime was available to run tasks on.
    #[error("runtime unavailable: {0}")]
    Runtime(String),
    /// One or more tasks failed during a run.
    #[error("{failed} of {total} tasks failed")]
    TasksFailed {
        /// Number of failed tasks.
        failed: usize,
        /// Number of tasks registered for the run.
        total: usize,
    },
    /// The run ended with tasks whose groups were never released.
    #[error("{blocked} of {total} tasks never became runnable")]
    TasksBlocked {
        /// Number of tasks left blocked.
        blocked: usize,
        /// Number of tasks registered for the run.
        total: usize,
    },
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors produced by [`Poller::poll`](crate::poller::Poller::poll).
#[derive(Debug, Error)]
pub enum PollError {
    /// The condition did not hold before the deadline.
    #[error("timed out after {elapsed:?} waiting for {description}")]
    Timeout {
        /// Time spent polling when the deadline was detected.
        elapsed: Duration,
        /// What was being waited on.
        description: String,
    },
    /// The predicate itself failed.
    #[error(transparent)]
    Predicate(#[from] anyhow::Error),
}

impl PollError {
    /// Whether this error is a deadline expiry rather than a predicate failure.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
