//! Bounded retry with exponential backoff.

use std::time::Duration;

use tracing::warn;

use crate::error::{Error, Result};

/// Retry policy: attempt budget plus exponential backoff.
///
/// The delay after attempt `n` (1-based) is `base_delay * 2^n`, so the
/// default policy of 3 attempts with a 1 second base waits 2s, 4s, and
/// 8s between/after failed attempts.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given attempt budget and base delay.
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Maximum number of attempts before giving up.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff delay applied after the given 1-based attempt number.
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }

    /// Runs `op` up to the attempt budget.
    ///
    /// `retryable` classifies failures: retryable errors are logged and
    /// retried after the backoff delay; anything else aborts immediately.
    /// After the budget is exhausted the last error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first non-retryable error, or the last retryable
    /// error once all attempts are spent.
    pub async fn run<T, F, Fut, P>(&self, mut op: F, retryable: P) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
        P: Fn(&Error) -> bool,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if retryable(&err) => {
                    let delay = self.delay_after(attempt);
                    warn!(attempt, ?delay, error = %err, "attempt failed, backing off");
                    last_error = Some(err);
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }

        Err(last_error.unwrap_or(Error::DownloadTimeout))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}
