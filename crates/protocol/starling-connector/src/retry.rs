//! Exponential backoff for the remote connector's network-level retries
//! (application-level rejects are never retried, see §4.7).

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ConnectorError, Result};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self { max_attempts, base_delay, max_delay }
    }

    /// Exponential backoff with +-25% jitter, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let multiplier = 2u64.saturating_pow(attempt - 1);
        let base = self.base_delay.saturating_mul(multiplier as u32);
        let capped = std::cmp::min(base, self.max_delay);

        let jitter_range = capped.as_millis() as u64 / 4;
        if jitter_range == 0 {
            return capped;
        }
        let jitter = rand::random::<u64>() % (jitter_range * 2);
        let jittered_ms = (capped.as_millis() as u64)
            .saturating_sub(jitter_range)
            .saturating_add(jitter);
        Duration::from_millis(jittered_ms)
    }

    /// Run `operation` with retry, skipping the backoff for non-retryable
    /// (application-level) errors.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..self.max_attempts {
            let delay = self.delay_for_attempt(attempt);
            if !delay.is_zero() {
                debug!(attempt, ?delay, "retrying connector call after delay");
                tokio::time::sleep(delay).await;
            }

            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt + 1 < self.max_attempts => {
                    warn!(attempt = attempt + 1, max_attempts = self.max_attempts, error = %e, "retryable connector error");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ConnectorError::Network("max retries exceeded".into())))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}
