//! Retry policy for transient fetch failures

use crate::config::RetryConfig;
use std::time::Duration;

/// How the walker retries a page after a timeout or connection failure
///
/// Backoff doubles from `base_delay` on each failed attempt and is capped at
/// `max_delay`. With `max_attempts == None` the page is retried until the
/// traversal is cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts allowed per page, `None` for unbounded
    pub max_attempts: Option<u32>,

    /// Delay after the first failed attempt
    pub base_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// A policy that retries until cancelled
    pub fn unbounded(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: None,
            base_delay,
            max_delay,
        }
    }

    /// A policy that gives up after `attempts` tries
    pub fn limited(attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: Some(attempts.max(1)),
            base_delay,
            max_delay,
        }
    }

    /// Returns true if another attempt may follow `attempts_made` failures
    pub fn allows_retry(&self, attempts_made: u32) -> bool {
        match self.max_attempts {
            Some(max) => attempts_made < max,
            None => true,
        }
    }

    /// Delay to wait after the `attempt`-th failure (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let factor = 1u32 << shift;
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        let base_delay = Duration::from_millis(config.base_delay_ms);
        let max_delay = Duration::from_millis(config.max_delay_ms);
        if config.max_attempts == 0 {
            Self::unbounded(base_delay, max_delay)
        } else {
            Self::limited(config.max_attempts, base_delay, max_delay)
        }
    }
}
