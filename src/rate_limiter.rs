//! Token bucket rate limiter.
//!
//! Bounds how often an operation runs against a downstream API. Callers
//! `wait()` for a token before each call; a caller that just got a throttling
//! response calls `empty()` so every waiter pauses for a full refill.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use env_reaper::RateLimiter;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let limiter = RateLimiter::new(Duration::from_millis(100));
//! limiter.wait().await; // first token is available immediately
//! assert_eq!(limiter.available_tokens(), 0);
//! # }
//! ```
//!
//! `wait()` has no timeout and no failure mode: a caller blocks until a token
//! is granted.

use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::config::RateLimiterConfig;
use crate::core::SchedulerError;

const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    last_fill: Instant,
}

/// Token bucket shared by every caller of one downstream API.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<Bucket>,
    max_tokens: u32,
    window: Duration,
    fill_rate: u32,
    initial_backoff: Duration,
}

impl RateLimiter {
    /// A bucket of one token, refilled once per `window`.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self::with_params(1, None, window, 1)
    }

    /// Build from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidOptions`] if the configuration is invalid.
    pub fn from_config(cfg: &RateLimiterConfig) -> Result<Self, SchedulerError> {
        cfg.validate().map_err(SchedulerError::InvalidOptions)?;
        Ok(Self::with_params(
            cfg.max_tokens,
            cfg.initial_tokens,
            Duration::from_millis(cfg.window_ms),
            cfg.fill_rate,
        ))
    }

    fn with_params(max_tokens: u32, initial_tokens: Option<u32>, window: Duration, fill_rate: u32) -> Self {
        let max_tokens = max_tokens.max(1);
        Self {
            bucket: Mutex::new(Bucket {
                tokens: initial_tokens.unwrap_or(max_tokens).min(max_tokens),
                last_fill: Instant::now(),
            }),
            max_tokens,
            window: window.max(Duration::from_millis(1)),
            fill_rate: fill_rate.max(1),
            initial_backoff: DEFAULT_BACKOFF,
        }
    }

    /// First delay used by [`throttle`](Self::throttle) after a throttling error.
    #[must_use]
    pub const fn with_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    /// Bucket capacity.
    #[must_use]
    pub const fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Tokens currently available, after accounting for elapsed time.
    #[must_use]
    pub fn available_tokens(&self) -> u32 {
        let mut bucket = self.bucket.lock();
        self.refill(&mut bucket, Instant::now());
        bucket.tokens
    }

    /// Take one token, sleeping until one is available.
    pub async fn wait(&self) {
        loop {
            let delay = {
                let mut bucket = self.bucket.lock();
                let now = Instant::now();
                self.refill(&mut bucket, now);
                if bucket.tokens > 0 {
                    bucket.tokens -= 1;
                    return;
                }
                self.token_interval()
                    .saturating_sub(now.saturating_duration_since(bucket.last_fill))
            };
            tracing::trace!(delay_ms = delay.as_millis(), "rate limited, waiting for token");
            tokio::time::sleep(delay.max(Duration::from_millis(1))).await;
        }
    }

    /// Drop all tokens and restart the refill window from now.
    pub fn empty(&self) {
        let mut bucket = self.bucket.lock();
        bucket.tokens = 0;
        bucket.last_fill = Instant::now();
    }

    /// Run `op` under the limiter, retrying with exponential backoff while
    /// `is_throttled` classifies its error as a throttling response.
    ///
    /// # Errors
    ///
    /// Returns the first error `is_throttled` rejects.
    pub async fn throttle<T, E, F, Fut, C>(&self, mut op: F, is_throttled: C) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: Fn(&E) -> bool,
    {
        let mut backoff = self.initial_backoff;
        loop {
            self.wait().await;
            match op().await {
                Err(err) if is_throttled(&err) => {
                    self.empty();
                    tracing::debug!(backoff_ms = backoff.as_millis(), "downstream throttled, backing off");
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
                other => return other,
            }
        }
    }

    fn token_interval(&self) -> Duration {
        self.window / self.fill_rate
    }

    fn refill(&self, bucket: &mut Bucket, now: Instant) {
        let elapsed = now.saturating_duration_since(bucket.last_fill).as_nanos();
        let window = self.window.as_nanos();
        let new_tokens = elapsed * u128::from(self.fill_rate) / window;
        if new_tokens == 0 {
            return;
        }
        let granted = u32::try_from(new_tokens).unwrap_or(u32::MAX);
        bucket.tokens = bucket.tokens.saturating_add(granted).min(self.max_tokens);
        // Advance by the time the granted tokens represent, keeping the remainder.
        let advance = new_tokens * window / u128::from(self.fill_rate);
        bucket.last_fill += Duration::from_nanos(u64::try_from(advance).unwrap_or(u64::MAX));
    }
}
