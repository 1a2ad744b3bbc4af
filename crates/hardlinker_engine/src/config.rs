//! Configuration for the event consumer.

use std::time::Duration;

/// Event type the consumer subscribes to by default.
pub const DEFAULT_EVENT_FILTER: &str = "ItemFinished";

/// Configuration for the event consumer.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Event types requested from the remote.
    pub filters: Vec<String>,
    /// Maximum number of events per poll.
    pub batch_limit: Option<u32>,
    /// How long the remote may hold an idle poll open.
    pub poll_timeout: Duration,
    /// Backoff after a failed poll.
    pub retry: RetryConfig,
}

impl ConsumerConfig {
    /// Creates a configuration with the default filter set.
    pub fn new() -> Self {
        Self {
            filters: vec![DEFAULT_EVENT_FILTER.to_string()],
            batch_limit: Some(10),
            poll_timeout: Duration::from_secs(60),
            retry: RetryConfig::default(),
        }
    }

    /// Sets the event type filters.
    pub fn with_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters = filters.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the batch limit. `None` lets the remote decide.
    pub fn with_batch_limit(mut self, limit: Option<u32>) -> Self {
        self.batch_limit = limit;
        self
    }

    /// Sets the long-poll timeout.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Delay between a failed poll and the next attempt.
///
/// Retries are unlimited. With the default multiplier of 1.0 the delay is
/// fixed; a larger multiplier grows it up to `max_delay`.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier applied per consecutive failure.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Creates a fixed-delay configuration.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0,
        }
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Calculates the delay after `failures` consecutive failures (1-indexed).
    pub fn delay_for_attempt(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }

        let base_delay = self.initial_delay.as_secs_f64()
            * self
                .backoff_multiplier
                .powi(failures.saturating_sub(1).min(i32::MAX as u32) as i32);

        let max = self.max_delay.max(self.initial_delay).as_secs_f64();
        Duration::from_secs_f64(base_delay.min(max))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(5))
    }
}
