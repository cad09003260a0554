//! Classifier retry decorator with exponential backoff.
//!
//! # Retry Strategy
//!
//! The delay between retries follows this formula:
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=max_jitter)
//! ```
//! with `max_delay` 30 seconds and `max_jitter` 250 milliseconds by default.

use super::{ClassificationRequest, ClassificationVerdict, ContentClassifier};
use crate::error::ClassifierError;
use async_trait::async_trait;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

/// Wraps a [`ContentClassifier`] and retries failed calls.
pub struct RetryClassifier<C> {
    /// The underlying classifier.
    inner: C,
    /// Retries after the first attempt before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: Duration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: Duration,
    /// Upper bound of the random jitter added to every delay.
    max_jitter: Duration,
}

impl<C> RetryClassifier<C>
where
    C: ContentClassifier,
{
    pub fn new(inner: C, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::from_millis(250),
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Delay before retry number `attempt` (1-based), without jitter.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(31) as u32;
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }
}

impl<C> fmt::Debug for RetryClassifier<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryClassifier")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("max_jitter", &self.max_jitter)
            .finish()
    }
}

#[async_trait]
impl<C> ContentClassifier for RetryClassifier<C>
where
    C: ContentClassifier,
{
    #[instrument(level = "info", skip_all, fields(url = %request.url))]
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassificationVerdict, ClassifierError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.classify(request).await {
                Ok(verdict) => return Ok(verdict),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "classify() exhausted retries"
                        );
                        return Err(e);
                    }

                    let jitter_ms = rng().random_range(0..=self.max_jitter.as_millis() as u64);
                    let delay = self.backoff(attempt) + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u64,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "classify() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
