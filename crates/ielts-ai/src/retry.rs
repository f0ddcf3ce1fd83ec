//! Retry policy and exponential backoff

use std::time::Duration;

use ielts_config::RetryConfig;
pub use ielts_config::Jitter;
use rand::Rng;

/// Whether an HTTP status indicates a transient upstream condition
///
/// Rate limiting (429) and server faults (5xx) are worth another attempt;
/// every other non-success status is final.
pub const fn is_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: Jitter,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000), Duration::from_millis(10_000), 2.0)
    }
}

impl RetryPolicy {
    /// Create a policy without jitter
    ///
    /// `max_attempts` is raised to at least 1 and a `multiplier` below 1 (or
    /// NaN) is treated as 1, so delays never shrink between attempts.
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration, multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
            multiplier: if multiplier >= 1.0 { multiplier } else { 1.0 },
            jitter: Jitter::None,
        }
    }

    /// A policy that makes exactly one attempt
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO, 1.0)
    }

    /// Randomise each backoff with `jitter`
    #[must_use]
    pub const fn with_jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = jitter;
        self
    }

    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub const fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub const fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub const fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub const fn jitter(&self) -> Jitter {
        self.jitter
    }

    /// Deterministic delay after the failed attempt number `attempt` (1-indexed)
    ///
    /// `min(initial_delay * multiplier^(attempt - 1), max_delay)`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let factor = self.multiplier.powi(exponent);
        let scaled = self.initial_delay.as_secs_f64() * factor;

        // An overflowed factor lands on the cap instead of reaching `mul_f64`
        if scaled.is_nan() || scaled >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }

        self.initial_delay.mul_f64(factor)
    }

    /// Delay to sleep after the failed attempt `attempt`, with jitter applied
    pub fn backoff(&self, attempt: u32) -> Duration {
        let delay = self.delay_for(attempt);

        match self.jitter {
            Jitter::None => delay,
            Jitter::Full => delay.mul_f64(rand::rng().random::<f64>()),
            Jitter::Equal => {
                let half = delay / 2;
                half + half.mul_f64(rand::rng().random::<f64>())
            }
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.initial_delay,
            config.max_delay,
            config.multiplier,
        )
        .with_jitter(config.jitter)
    }
}
