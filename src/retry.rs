//! Rate-limit aware retry loop. This is the only place in the crate that retries.

use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use crate::error::ApiError;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Run `operation` until it succeeds, fails with something other than a
    /// rate limit, or the attempt budget is spent.
    ///
    /// Before each retry the task sleeps for the larger of the server's reset
    /// hint and the current backoff; the backoff then grows by `backoff_factor`.
    /// Exhausting the budget yields `MAX_RETRIES` wrapping the last failure.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut backoff = self.initial_delay;
        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_rate_limit_error() => {
                    debug!("attempt {}: non-retryable error {}", attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        let wait = e.retry_delay().max(backoff);
                        warn!(
                            "Rate limited (attempt {}/{}). Retrying in {:.1}s...",
                            attempt,
                            self.max_retries,
                            wait.as_secs_f64()
                        );
                        tokio::time::sleep(wait).await;
                        backoff = backoff.mul_f64(self.backoff_factor);
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(ApiError::max_retries(last_error))
    }
}

/// [`RetryPolicy::run`] with the given parameters.
pub async fn run_with_retry<T, F, Fut>(
    operation: F,
    max_retries: u32,
    initial_delay: Duration,
    backoff_factor: f64,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    RetryPolicy {
        max_retries,
        initial_delay,
        backoff_factor,
    }
    .run(operation)
    .await
}
