//! Refresh retry policy

use std::time::Duration;

use dealroom_domain::constants::{DEFAULT_REFRESH_BASE_DELAY_MS, DEFAULT_REFRESH_MAX_ATTEMPTS};
use dealroom_domain::RetryConfig;

/// Bounded exponential backoff for the refresh loop.
///
/// `backoff(n) = 2^(n-1) * base_delay`, applied after attempt `n` only while
/// `n < max_attempts`. Nothing is waited after the last attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_REFRESH_MAX_ATTEMPTS,
            Duration::from_millis(DEFAULT_REFRESH_BASE_DELAY_MS),
        )
    }
}

impl RetryPolicy {
    /// Create a policy; at least one attempt is always made.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self { max_attempts: max_attempts.max(1), base_delay }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.base_delay())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay following the given (1-based) attempt
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << shift)
    }

    /// Delay to wait before the next attempt, or `None` when `attempt` was
    /// the last one.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        (attempt < self.max_attempts).then(|| self.backoff(attempt))
    }

    /// Total time spent sleeping when every attempt fails retryably
    pub fn worst_case_wait(&self) -> Duration {
        (1..self.max_attempts).map(|attempt| self.backoff(attempt)).sum()
    }
}
