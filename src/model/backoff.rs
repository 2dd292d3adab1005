//! Transport-level retry with exponential backoff and jitter.
//!
//! [`BackoffConfig`] decides how transient HTTP failures (429, 5xx) from the
//! model API are retried. Lesson generation is usually unattended, so the
//! defaults lean patient: [`BackoffConfig::standard()`] for a single lesson,
//! [`BackoffConfig::batch()`] when a digest run fans out many topics against
//! a shared rate limit.

use std::time::Duration;

/// Retry policy for calls to the model API.
///
/// A digest run can issue dozens of requests back to back, which is exactly
/// when providers start returning 429. Retrying with growing, jittered delays
/// lets the run finish instead of failing on the first rate limit.
///
/// # Example
///
/// ```
/// use lessonmail::model::BackoffConfig;
///
/// // No retry, for tests and local stubs.
/// let none = BackoffConfig::none();
/// assert_eq!(none.max_retries, 0);
///
/// // Default policy for hosted APIs.
/// let standard = BackoffConfig::standard();
/// assert_eq!(standard.max_retries, 3);
/// ```
#[derive(Debug, Clone)]
pub struct BackoffConfig {
    /// Maximum number of transport retries. Default: 0 (no retry).
    pub max_retries: u32,

    /// Delay before the first retry. Default: 1 second.
    pub initial_delay: Duration,

    /// Multiplier applied after each retry. Default: 2.0.
    /// Delays grow: initial, initial * multiplier, initial * multiplier^2, ...
    pub multiplier: f64,

    /// Ceiling on any single delay. Default: 60 seconds.
    pub max_delay: Duration,

    /// Jitter strategy. Default: Full.
    pub jitter: JitterStrategy,

    /// HTTP status codes that trigger retry. Default: `[429, 500, 502, 503, 504]`.
    pub retryable_statuses: Vec<u16>,

    /// Whether to honor `Retry-After` headers from the provider.
    /// Default: `true`.
    pub respect_retry_after: bool,
}

/// Jitter strategy to keep parallel lesson requests from retrying in lockstep.
///
/// # Example
///
/// ```
/// use lessonmail::model::backoff::JitterStrategy;
///
/// let jitter = JitterStrategy::Full;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterStrategy {
    /// No jitter. Delay is exactly the calculated value.
    None,

    /// Full jitter: random value in `[0, calculated_delay]`.
    Full,

    /// Equal jitter: `calculated_delay/2 + random in [0, calculated_delay/2]`.
    Equal,
}

impl BackoffConfig {
    /// No transport retry. For tests, [`MockModel`](crate::model::MockModel),
    /// or callers that handle errors themselves.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::standard()
        }
    }

    /// Default policy for hosted model APIs: 3 retries, 1s initial delay,
    /// 2x multiplier, 60s cap, full jitter, honors Retry-After.
    pub fn standard() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
            jitter: JitterStrategy::Full,
            retryable_statuses: vec![429, 500, 502, 503, 504],
            respect_retry_after: true,
        }
    }

    /// Patient policy for unattended digest runs: 5 retries, 500ms initial
    /// delay, 2 minute cap. Nobody is waiting, so waiting out a rate limit
    /// beats losing a lesson.
    pub fn batch() -> Self {
        Self {
            max_retries: 5,
            initial_delay: Duration::from_millis(500),
            multiplier: 2.0,
            max_delay: Duration::from_secs(120),
            jitter: JitterStrategy::Full,
            retryable_statuses: vec![429, 500, 502, 503, 504],
            respect_retry_after: true,
        }
    }

    /// Short policy for previews where a person is watching: 2 retries,
    /// 500ms initial delay, 10s cap.
    pub fn interactive() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            multiplier: 1.5,
            max_delay: Duration::from_secs(10),
            jitter: JitterStrategy::Full,
            retryable_statuses: vec![429, 500, 502, 503, 504],
            respect_retry_after: true,
        }
    }

    /// Calculate the delay for attempt N (0-indexed).
    ///
    /// The base delay is `initial_delay * multiplier^attempt`, capped at
    /// `max_delay`, then jittered according to the configured strategy.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_secs_f64());

        let jittered = match self.jitter {
            JitterStrategy::None => capped,
            JitterStrategy::Full => fastrand::f64() * capped,
            JitterStrategy::Equal => capped / 2.0 + fastrand::f64() * (capped / 2.0),
        };

        Duration::from_secs_f64(jittered)
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self::none()
    }
}
