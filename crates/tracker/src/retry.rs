//! Exponential-backoff policy for failed status polls.
//!
//! A transient failure never ends tracking on its own. Each consecutive
//! failure stretches the wait before the next poll, up to
//! [`RetryPolicy::max_delay`]. An optional cap on consecutive failures
//! lets the tracker give up.

use std::time::Duration;

/// Tunable parameters for poll retries.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Delay before the first retry after a failure.
    pub initial_delay: Duration,
    /// Upper bound on the delay between retries. A bound below
    /// `initial_delay` is raised to it, so a failing service is never
    /// retried faster than the normal cadence.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
    /// Give up after this many consecutive failures. `None` retries forever.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            max_consecutive_failures: None,
        }
    }
}

impl RetryPolicy {
    /// Whether `failures` consecutive failures exhaust this policy.
    pub fn is_exhausted(&self, failures: u32) -> bool {
        self.max_consecutive_failures
            .is_some_and(|max| failures >= max)
    }

    /// Delay to wait after the `failures`-th consecutive failure (1-based).
    pub fn delay_for(&self, failures: u32) -> Duration {
        let ceiling = self.ceiling();
        let mut delay = self.initial_delay;
        for _ in 1..failures {
            delay = next_delay(delay, self);
            if delay == ceiling {
                break;
            }
        }
        delay
    }

    fn ceiling(&self) -> Duration {
        self.max_delay.max(self.initial_delay)
    }
}

/// Calculate the next backoff delay from the current delay and policy.
///
/// The result is clamped to [`RetryPolicy::max_delay`], or to
/// [`RetryPolicy::initial_delay`] when that is larger.
pub fn next_delay(current: Duration, policy: &RetryPolicy) -> Duration {
    let next_ms = (current.as_millis() as f64 * policy.multiplier) as u64;
    Duration::from_millis(next_ms).min(policy.ceiling())
}
