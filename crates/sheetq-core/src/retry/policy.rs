use std::time::Duration;

use rand::Rng;

use super::classify::{classify, Classification};
use super::error::FailureKind;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff with proportional jitter.
///
/// The delay before retry `attempt + 1` is `base_delay * 2^attempt` plus a
/// uniform jitter in `[0, jitter_ratio * delay]`. There is no upper cap; the
/// retry budget bounds total wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound of the jitter as a fraction of the backoff delay.
    pub jitter_ratio: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            jitter_ratio: 0.3,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay (without jitter) after the failed attempt with index `attempt`.
    ///
    /// `attempt` is 0-based (0 = first attempt).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Decide whether to retry after attempt `attempt` failed with `kind`.
    ///
    /// `budget` is the number of retries allowed beyond the first attempt.
    pub fn decide(&self, attempt: u32, budget: u32, kind: FailureKind) -> RetryDecision {
        if classify(kind) == Classification::Terminal || attempt >= budget {
            return RetryDecision::NoRetry;
        }
        let delay = self.backoff(attempt);
        RetryDecision::RetryAfter(delay.saturating_add(self.jitter(delay)))
    }

    fn jitter(&self, delay: Duration) -> Duration {
        let max = delay.as_secs_f64() * self.jitter_ratio.max(0.0);
        if max <= 0.0 {
            return Duration::ZERO;
        }
        let secs = rand::thread_rng().gen_range(0.0..max);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }
}
