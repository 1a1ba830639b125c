//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failure is retryable (transient only by default)
//! - Re-run the operation with a fixed delay between attempts
//! - Bound the number of attempts and tag exhaustion
//!
//! # Design Decisions
//! - Fixed delay, no backoff growth and no wait before the first attempt
//! - Permanent failures return immediately, untagged
//! - The policy is immutable; one instance is shared by every invoker

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::CallError;

type RetryPredicate = Arc<dyn Fn(&CallError) -> bool + Send + Sync>;

/// Bounded retry with a fixed inter-attempt delay.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    retryable: RetryPredicate,
}

impl RetryPolicy {
    /// Policy retrying transient failures. `max_attempts` of 0 is treated as 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            retryable: Arc::new(CallError::is_transient),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.delay_ms))
    }

    /// Replace the retryability predicate.
    pub fn with_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&CallError) -> bool + Send + Sync + 'static,
    {
        self.retryable = Arc::new(predicate);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_retryable(&self, error: &CallError) -> bool {
        (self.retryable)(error)
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    ///
    /// # Errors
    /// The original failure if it is not retryable, otherwise
    /// `CallError::RetryExhausted` carrying the last failure.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, CallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CallError>>,
    {
        let mut attempt = 1;
        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !self.is_retryable(&error) {
                tracing::debug!(attempt, error = %error, "Non-retryable failure");
                return Err(error);
            }

            if attempt >= self.max_attempts {
                tracing::debug!(attempts = attempt, error = %error, "Retry attempts exhausted");
                return Err(CallError::RetryExhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            tracing::info!(attempt, delay = ?self.delay, error = %error, "Retrying call");
            tokio::time::sleep(self.delay).await;
            attempt += 1;
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
