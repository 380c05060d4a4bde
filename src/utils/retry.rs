//! Retry configuration for delivery attempts.

use backon::ConstantBuilder;
use std::time::Duration;

/// Configuration for delivery retries.
///
/// Attempts are flat: `retries + 1` tries in a row with no delay in between.
/// There is no backoff and no classification of errors; every failure is
/// retried the same way.
///
/// ```rust
/// use otp_gateway::RetryConfig;
///
/// let config = RetryConfig::default().with_retries(4);
/// assert_eq!(config.total_attempts(), 5);
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Number of retries after the first attempt (default: 2).
    pub retries: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { retries: 2 }
    }
}

impl RetryConfig {
    /// Set the number of retries after the first attempt.
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    /// Total attempts including the first one.
    pub fn total_attempts(&self) -> usize {
        self.retries + 1
    }

    /// Build a backoff strategy from this configuration.
    pub fn build_strategy(&self) -> ConstantBuilder {
        ConstantBuilder::default()
            .with_delay(Duration::ZERO)
            .with_max_times(self.retries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_three_attempts() {
        let config = RetryConfig::default();
        assert_eq!(config.retries, 2);
        assert_eq!(config.total_attempts(), 3);
    }

    #[test]
    fn test_zero_retries() {
        assert_eq!(RetryConfig::default().with_retries(0).total_attempts(), 1);
    }
}
