use std::time::Duration;

/// Exponential reconnect schedule: `base`, `2·base`, `4·base`, ... for at most
/// `max_retries` consecutive failed attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base_delay: Duration,
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_retries: 5,
        }
    }
}

impl BackoffPolicy {
    /// Wait before the retry that follows failure number `failure` (1-based).
    pub fn delay_after(&self, failure: u32) -> Duration {
        let exp = failure.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exp)
    }
}

/// Consecutive-failure counter for one connection lifecycle.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    failures: u32,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            failures: 0,
        }
    }

    /// Record a failed attempt. Returns the wait before the next one, or
    /// `None` once `max_retries` attempts in a row have failed.
    pub fn record_failure(&mut self) -> Option<Duration> {
        self.failures = self.failures.saturating_add(1);
        if self.is_exhausted() {
            return None;
        }
        Some(self.policy.delay_after(self.failures))
    }

    /// A connection was established; the schedule starts over.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn is_exhausted(&self) -> bool {
        self.failures >= self.policy.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_from_base() {
        let policy = BackoffPolicy::default();
        let delays: Vec<u64> = (1..=4).map(|n| policy.delay_after(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8]);
    }

    #[test]
    fn stops_after_max_retries() {
        let mut backoff = Backoff::new(BackoffPolicy::default());

        for _ in 0..4 {
            assert!(backoff.record_failure().is_some());
        }
        assert_eq!(backoff.record_failure(), None);
        assert!(backoff.is_exhausted());
        assert_eq!(backoff.failures(), 5);
    }

    #[test]
    fn reset_starts_over() {
        let mut backoff = Backoff::new(BackoffPolicy::default());
        backoff.record_failure();
        backoff.record_failure();
        backoff.reset();

        assert_eq!(backoff.record_failure(), Some(Duration::from_secs(1)));
    }

    #[test]
    fn zero_retries_never_retries() {
        let mut backoff = Backoff::new(BackoffPolicy {
            base_delay: Duration::from_millis(10),
            max_retries: 0,
        });
        assert_eq!(backoff.record_failure(), None);
    }
}
