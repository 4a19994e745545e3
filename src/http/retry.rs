//! Retry policy
//!
//! The policy only answers "how many attempts" and "how long to wait after
//! attempt n"; the loop that consumes it lives in the client.

use std::time::Duration;

/// Default number of attempts per page request
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default delay after the first failed attempt
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(1500);

/// Exponential backoff, uncapped unless [`RetryPolicy::with_max_backoff`] is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay after the first failed attempt
    pub initial_backoff: Duration,
    /// Cap for a single delay, `Duration::MAX` for none
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: Duration::MAX,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt count and base delay
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff: Duration::MAX,
        }
    }

    /// Set the cap for a single delay
    #[must_use]
    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Delay to wait after the `attempt`-th failure (1-based).
    ///
    /// Doubles each time: `initial`, `2 * initial`, `4 * initial`, ...
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        let factor = 2u32.saturating_pow(exponent);
        let delay = self
            .initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff);
        delay.min(self.max_backoff)
    }

    /// Whether another attempt is allowed after `attempt` attempts
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Sum of the delays slept before the given number of retries
    pub fn total_delay(&self, retries: u32) -> Duration {
        (1..=retries).map(|n| self.delay_for_attempt(n)).sum()
    }
}
