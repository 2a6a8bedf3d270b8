//! Pluggable retry policy for order submission.

use std::time::Duration;

use crate::domain::repositories::exchange_client::ExchangeError;

/// Decides whether, and after how long, a failed submission is retried.
/// `attempt` counts attempts already made (1 on the first failure).
pub trait RetryPolicy: Send {
    fn next_delay(&mut self, attempt: u32, error: &ExchangeError) -> Option<Duration>;
}

/// Production policy: retry forever at a fixed short delay, with no backoff
/// growth and no error classification. Once the moment has arrived every
/// failure is assumed transient (rate limit, timing-window rejection,
/// network blip); a wasted attempt is cheaper than aborting a time-critical
/// trade. Known, accepted risk: a permanently invalid request retries
/// forever.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

impl RetryPolicy for FixedDelay {
    fn next_delay(&mut self, _attempt: u32, _error: &ExchangeError) -> Option<Duration> {
        Some(self.delay)
    }
}

/// Fixed delay with an attempt cap. Used by tests, and by anyone who wants
/// the submission loop to give up eventually.
#[derive(Debug, Clone, Copy)]
pub struct BoundedRetry {
    delay: Duration,
    max_attempts: u32,
}

impl BoundedRetry {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }
}

impl RetryPolicy for BoundedRetry {
    fn next_delay(&mut self, attempt: u32, _error: &ExchangeError) -> Option<Duration> {
        (attempt < self.max_attempts).then_some(self.delay)
    }
}
