//! Bounded retry policy for the HTTP executor.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;
use crate::error::XpostError;

/// Retry decision result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after a delay.
    RetryAfter(Duration),
    /// Give up and surface the error.
    DoNotRetry,
}

/// Exponential backoff with a hard attempt ceiling.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries, server hints included.
    pub max_delay: Duration,
    /// Fraction of the delay added as random jitter.
    pub jitter: f64,
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            jitter: config.jitter.clamp(0.0, 1.0),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Decide what to do after `attempt` (1-based) failed with `error`.
    ///
    /// Only transient failures and rate limiting are retried. A server
    /// `Retry-After` hint replaces the computed backoff, capped at
    /// `max_delay`.
    #[must_use]
    pub fn decide(&self, error: &XpostError, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts || !error.is_retryable() {
            return RetryDecision::DoNotRetry;
        }

        let delay = error
            .retry_after()
            .unwrap_or_else(|| self.with_jitter(self.backoff(attempt)));

        RetryDecision::RetryAfter(delay.min(self.max_delay))
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    fn with_jitter(&self, delay: Duration) -> Duration {
        if self.jitter <= 0.0 || delay.is_zero() {
            return delay;
        }
        let extra = delay.mul_f64(rand::thread_rng().gen_range(0.0..=self.jitter));
        delay.saturating_add(extra)
    }
}
