//! Fixed-interval poller.
//!
//! Tasks use this to wait for a remote system to reach a state, for example a
//! database instance to finish deleting before its subnet group can go.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::PollerConfig;
use crate::core::{PollError, SchedulerError};

/// Per-call overrides for [`Poller::poll`].
#[derive(Debug, Clone, Default)]
pub struct PollOptions {
    /// What is being waited on; used only in log lines and timeout messages.
    pub description: Option<String>,
    /// Overrides the poller's interval.
    pub interval: Option<Duration>,
    /// Overrides the poller's timeout: `None` keeps it, `Some(None)` polls
    /// without a deadline, `Some(Some(d))` replaces it.
    pub timeout: Option<Option<Duration>>,
}

impl PollOptions {
    /// Options carrying only a description.
    #[must_use]
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Override the interval for this call.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Override the timeout for this call.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(Some(timeout));
        self
    }

    /// Poll without a deadline for this call, even if the poller has one.
    #[must_use]
    pub const fn no_timeout(mut self) -> Self {
        self.timeout = Some(None);
        self
    }
}

/// Re-evaluates an async predicate at a fixed interval until it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    interval: Duration,
    timeout: Option<Duration>,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl Poller {
    /// Poll every `interval`, with no deadline.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            timeout: None,
        }
    }

    /// Fail with [`PollError::Timeout`] once `timeout` has elapsed.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidOptions`] if the configuration is invalid.
    pub fn from_config(cfg: &PollerConfig) -> Result<Self, SchedulerError> {
        cfg.validate().map_err(SchedulerError::InvalidOptions)?;
        Ok(Self {
            interval: Duration::from_millis(cfg.interval_ms),
            timeout: cfg.timeout_ms.map(Duration::from_millis),
        })
    }

    /// Configured interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Wait until `predicate` returns `true`.
    ///
    /// The predicate receives the time elapsed since polling began. It is
    /// called once immediately; only if that returns `false` does polling
    /// sleep between calls.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Timeout`] if the deadline passes and
    /// [`PollError::Predicate`] as soon as the predicate fails.
    pub async fn poll<F, Fut>(&self, mut predicate: F, options: PollOptions) -> Result<(), PollError>
    where
        F: FnMut(Duration) -> Fut,
        Fut: Future<Output = anyhow::Result<bool>>,
    {
        let interval = options.interval.unwrap_or(self.interval);
        let timeout = options.timeout.unwrap_or(self.timeout);
        let description = options.description.as_deref().unwrap_or("condition");
        let start = Instant::now();

        if predicate(Duration::ZERO).await? {
            return Ok(());
        }

        loop {
            tokio::time::sleep(interval).await;
            let elapsed = start.elapsed();
            if predicate(elapsed).await? {
                tracing::debug!(description, elapsed_ms = elapsed.as_millis(), "condition met");
                return Ok(());
            }
            if let Some(timeout) = timeout {
                if elapsed > timeout {
                    return Err(PollError::Timeout {
                        elapsed,
                        description: description.to_string(),
                    });
                }
            }
            tracing::debug!(description, elapsed_ms = elapsed.as_millis(), "still waiting");
        }
    }
}
