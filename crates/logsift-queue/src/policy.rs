//! Explicit retry policy: attempt ceiling plus exponential backoff.

use std::time::Duration;

/// Governs how often a failing job is retried and how long the queue
/// waits between attempts.
///
/// A job is attempted at most `max_attempts` times in total; the delay
/// before attempt `n + 1` is `backoff_base * 2^n`, capped at
/// `backoff_cap`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration, backoff_cap: Duration) -> Self {
        Self {
            // A ceiling of zero would make every job unrunnable.
            max_attempts: max_attempts.max(1),
            backoff_base,
            backoff_cap,
        }
    }

    /// Whether a job that has already used `attempts_used` attempts may
    /// run again.
    #[inline]
    pub fn allows_retry(&self, attempts_used: u32) -> bool {
        attempts_used < self.max_attempts
    }

    /// Delay before re-running a job whose zero-based attempt counter was
    /// `attempt` when it failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt.min(16)).unwrap_or(u32::MAX);
        let delay = self
            .backoff_base
            .checked_mul(factor)
            .unwrap_or(self.backoff_cap);
        delay.min(self.backoff_cap)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
            backoff_cap: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let policy = RetryPolicy::new(
            5,
            Duration::from_millis(500),
            Duration::from_secs(30),
        );
        assert_eq!(policy.delay_for(0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(8));
        assert_eq!(policy.delay_for(6), Duration::from_secs(8));
        // Large attempt counters must not overflow.
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(8));
    }

    #[test]
    fn test_attempt_ceiling() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_retry(0));
        assert!(policy.allows_retry(2));
        assert!(!policy.allows_retry(3));
    }

    #[test]
    fn test_zero_max_attempts_is_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO);
        assert_eq!(policy.max_attempts, 1);
    }
}
