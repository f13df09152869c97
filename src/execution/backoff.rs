use crate::config::BackoffConfig;
use std::time::Duration;

/// Exponential backoff between retries of a transiently failing unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    initial: Duration,
    max: Duration,
    multiplier: f64,
}

impl BackoffPolicy {
    pub fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            initial,
            max,
            multiplier,
        }
    }

    /// Delay before retry number `attempt` (1-based): `initial * multiplier^(attempt-1)`, capped at `max`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled_ms = self.initial.as_millis() as f64 * self.multiplier.powi(exponent);
        let max_ms = self.max.as_millis() as f64;

        if !scaled_ms.is_finite() || scaled_ms >= max_ms {
            self.max
        } else {
            Duration::from_millis(scaled_ms as u64)
        }
    }
}

impl From<&BackoffConfig> for BackoffPolicy {
    fn from(config: &BackoffConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
            config.backoff_multiplier,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_schedule() {
        let policy = BackoffPolicy::from(&BackoffConfig::default());

        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1_000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2_000));
        assert_eq!(policy.delay_for(10), Duration::from_millis(10_000));
    }

    proptest! {
        #[test]
        fn delay_never_exceeds_cap(
            initial in 0u64..5_000,
            extra in 0u64..60_000,
            multiplier in 1.0f64..8.0,
            attempt in 0u32..200,
        ) {
            let max = initial + extra;
            let policy = BackoffPolicy::new(
                Duration::from_millis(initial),
                Duration::from_millis(max),
                multiplier,
            );
            let delay = policy.delay_for(attempt);

            prop_assert!(delay <= Duration::from_millis(max));
            prop_assert!(delay >= Duration::from_millis(initial).min(Duration::from_millis(max)));
        }

        #[test]
        fn delay_is_monotonic(attempt in 1u32..64) {
            let policy = BackoffPolicy::from(&BackoffConfig::default());
            prop_assert!(policy.delay_for(attempt) <= policy.delay_for(attempt + 1));
        }
    }
}
