//! Retry policy shared by the fetch executors and the pipeline wrapper.
//!
//! A policy distinguishes two kinds of retry. Errors matching `needs_backoff`
//! wait `base_delay * backoff_multiplier^n`, where `n` counts the backoffs
//! already taken in this run; other retryable errors wait the flat
//! `retry_delay` (zero means immediately). Errors rejected by `is_retryable`
//! end the run at once.

use crate::error::CollectorError;
use crate::fetch::error::FetchError;
use log::{error, warn};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug)]
pub struct RetryPolicy<E> {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_multiplier: u32,
    pub retry_delay: Duration,
    pub is_retryable: fn(&E) -> bool,
    pub needs_backoff: fn(&E) -> bool,
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for RetryPolicy<E> {}

impl<E: Display> RetryPolicy<E> {
    /// Delay before the retry following the `index`-th backoff (0-based).
    pub fn backoff_delay(&self, index: u32) -> Duration {
        let factor = self.backoff_multiplier.saturating_pow(index);
        self.base_delay.saturating_mul(factor)
    }

    /// Delay to wait after `err`, given how many backoffs were already taken.
    fn delay_for(&self, err: &E, backoffs_taken: u32) -> (Duration, bool) {
        if (self.needs_backoff)(err) {
            (self.backoff_delay(backoffs_taken), true)
        } else {
            (self.retry_delay, false)
        }
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or
    /// `max_attempts` is reached. `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut>(&self, context: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut backoffs_taken = 0;
        let mut attempt = 1;
        loop {
            let err = match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !(self.is_retryable)(&err) {
                warn!("{}: attempt {}/{} failed, not retrying: {}", context, attempt, max_attempts, err);
                return Err(err);
            }
            if attempt >= max_attempts {
                error!("{}: all {} attempts failed, last error: {}", context, max_attempts, err);
                return Err(err);
            }

            let (delay, backed_off) = self.delay_for(&err, backoffs_taken);
            if backed_off {
                backoffs_taken += 1;
            }
            warn!(
                "{}: attempt {}/{} failed: {}. Retrying in {:?}",
                context, attempt, max_attempts, err, delay
            );
            if !delay.is_zero() {
                sleep(delay).await;
            }
            attempt += 1;
        }
    }
}

impl RetryPolicy<FetchError> {
    /// Batch calls: every failure is retried; rate limiting backs off from
    /// `rate_limit_delay`, doubling each time, everything else retries at once.
    pub fn batch(max_attempts: u32, rate_limit_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay: rate_limit_delay,
            backoff_multiplier: 2,
            retry_delay: Duration::ZERO,
            is_retryable: |_| true,
            needs_backoff: FetchError::is_rate_limited,
        }
    }

    /// Per-location calls: transient failures retried after a fixed delay;
    /// a non-2xx answer is final.
    pub fn per_item(retries: u32, delay: Duration) -> Self {
        Self {
            max_attempts: retries + 1,
            base_delay: delay,
            backoff_multiplier: 1,
            retry_delay: delay,
            is_retryable: FetchError::is_transient,
            needs_backoff: |_| false,
        }
    }
}

impl RetryPolicy<CollectorError> {
    /// Whole-pipeline retries: `base_delay * 2^(attempt-1)` between attempts,
    /// except for configuration problems, which fail at once.
    pub fn pipeline(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff_multiplier: 2,
            retry_delay: base_delay,
            is_retryable: CollectorError::is_retryable,
            needs_backoff: |_| true,
        }
    }
}
