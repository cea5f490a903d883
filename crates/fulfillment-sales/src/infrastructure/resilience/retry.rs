//! Retry schedule: exponential backoff with additive jitter.

use std::time::Duration;

/// Classifies a failure as worth retrying.
pub trait Transient {
    /// `true` for failures that may succeed on a later attempt (network
    /// errors, server errors, rate limiting).
    fn is_transient(&self) -> bool;
}

/// Retry parameters.
///
/// The wait before attempt `n` (1-based, `n ≥ 2`) is
/// `base_delay × 2^(n-2)` plus a jitter drawn uniformly from
/// `[0, max_jitter)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Wait before the second attempt, before jitter.
    pub base_delay: Duration,
    /// Exclusive upper bound of the random jitter.
    pub max_jitter: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
            max_jitter: Duration::from_millis(100),
        }
    }
}

impl RetryConfig {
    /// Wait before `attempt` without jitter. The first attempt never waits.
    #[must_use]
    pub fn nominal_delay(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 2).min(16);
        self.base_delay.saturating_mul(1_u32 << exponent)
    }

    /// Largest jitter value in whole milliseconds, or `None` when jitter is
    /// disabled.
    #[must_use]
    pub fn jitter_ceiling_ms(&self) -> Option<u32> {
        let millis = u32::try_from(self.max_jitter.as_millis()).unwrap_or(u32::MAX);
        millis.checked_sub(1)
    }
}
