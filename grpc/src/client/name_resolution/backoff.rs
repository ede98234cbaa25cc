use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone)]
pub(crate) struct BackoffConfig {
    /// The amount of time to backoff after the first failure.
    pub base_delay: Duration,

    /// The factor with which to multiply backoffs after a failed retry.
    pub multiplier: f64,

    /// The factor with which backoffs are randomized.
    pub jitter: f64,

    /// The upper bound of backoff delay.
    pub max_delay: Duration,
}

/// The gRPC connection backoff parameters.
pub(crate) const DEFAULT_EXPONENTIAL_CONFIG: BackoffConfig = BackoffConfig {
    base_delay: Duration::from_secs(1),
    multiplier: 1.6,
    jitter: 0.2,
    max_delay: Duration::from_secs(120),
};

pub(crate) struct ExponentialBackoff {
    config: BackoffConfig,
    next_delay_secs: f64,
}

impl ExponentialBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        let next_delay_secs = config.base_delay.as_secs_f64();
        ExponentialBackoff {
            config,
            next_delay_secs,
        }
    }

    pub fn reset(&mut self) {
        self.next_delay_secs = self.config.base_delay.as_secs_f64();
    }

    /// Returns the delay before the next attempt and grows the delay for the
    /// one after it.
    pub fn backoff_duration(&mut self) -> Duration {
        let cur = self.next_delay_secs;
        let max_delay_secs = self.config.max_delay.as_secs_f64();
        self.next_delay_secs = (cur * self.config.multiplier).min(max_delay_secs);
        let jitter = self.config.jitter;
        let factor = 1.0 + rand::thread_rng().gen_range(-jitter..=jitter);
        Duration::from_secs_f64((cur * factor).max(0.0))
    }
}
