//! Retry configuration and a retrying scan queue wrapper.

use crate::core::{ScanJob, ScanQueue, ScanQueueError};

use async_trait::async_trait;
use std::time::Duration;

/// Backoff schedule for re-sending a scan job after a transient failure.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,

    /// Wait before the second attempt.
    pub initial_delay: Duration,

    /// Upper bound on any single wait.
    pub max_delay: Duration,

    /// Growth factor applied to the wait after each failed attempt.
    pub backoff_multiplier: f64,

    /// Spread waits so concurrent uploads do not retry in lockstep.
    pub jitter: bool,
}

impl Default for RetryConfig {
    /// One retry after 250 ms, never waiting more than a second.
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Returns the default schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// A single attempt, no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Sets the attempt budget. At least one attempt is always made.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the first wait.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the wait cap.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the growth factor, never below 1.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    /// Turns jitter on or off.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Wait before the given attempt, counting from zero. The first
    /// attempt never waits.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let growth = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let capped = (self.initial_delay.as_millis() as f64 * growth)
            .min(self.max_delay.as_millis() as f64);

        let delay = if self.jitter {
            // Deterministic spread in [0.5, 1.0) keyed on the attempt.
            capped * (0.5 + (attempt as f64 * 0.618033988749895) % 0.5)
        } else {
            capped
        };

        Duration::from_millis(delay as u64)
    }

    /// Returns `true` if `attempts_made` leaves budget for another try.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

/// Scan queue that retries transient failures of an inner queue.
///
/// Configuration errors such as a missing transport are returned at once.
/// Once attempts run out the last error is returned, so a failed enqueue is
/// never swallowed.
///
/// # Examples
///
/// ```rust
/// use docbridge::engine::{RetryConfig, RetryingScanQueue};
/// use docbridge::store::InMemoryScanQueue;
///
/// let queue = RetryingScanQueue::new(InMemoryScanQueue::default(), RetryConfig::default());
/// assert_eq!(queue.config().max_attempts, 2);
/// ```
#[derive(Debug)]
pub struct RetryingScanQueue<Q> {
    inner: Q,
    config: RetryConfig,
}

impl<Q: ScanQueue> RetryingScanQueue<Q> {
    /// Wraps a queue.
    pub fn new(inner: Q, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Returns the retry configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Returns the wrapped queue.
    pub fn inner(&self) -> &Q {
        &self.inner
    }
}

#[async_trait]
impl<Q: ScanQueue> ScanQueue for RetryingScanQueue<Q> {
    async fn enqueue(&self, job: &ScanJob) -> Result<(), ScanQueueError> {
        let mut attempt = 0;
        loop {
            let delay = self.config.delay_for_attempt(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            match self.inner.enqueue(job).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    attempt += 1;
                    if !e.is_transient() || !self.config.should_retry(attempt) {
                        return Err(e);
                    }
                    tracing::debug!(
                        document_id = %job.document_id,
                        attempt = attempt,
                        max_attempts = self.config.max_attempts,
                        error = %e,
                        "Retrying scan enqueue"
                    );
                }
            }
        }
    }
}
