//! Bounded polling.
//!
//! [`ActionRetrier`] repeatedly fetches a value until a predicate says it has
//! settled, sleeping between attempts and giving up after a fixed number of
//! attempts. It knows nothing about what it polls.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::StagingError;

/// A settled value and the number of fetches it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome<T> {
    /// The first value for which the predicate returned false.
    pub value: T,

    /// Number of fetches performed, including the settling one.
    pub attempts: u32,
}

/// Why polling stopped without settling.
#[derive(Debug)]
pub enum RetryError<T> {
    /// Every attempt returned a value that was still unsettled.
    Exhausted {
        /// Last observed value.
        last: T,
        /// Number of fetches performed.
        attempts: u32,
    },

    /// A fetch failed with a non-transient error, or the last attempt failed.
    Failed {
        /// The failure.
        error: StagingError,
        /// Number of fetches performed.
        attempts: u32,
    },
}

/// Polls a value until it settles or the attempt budget is spent.
pub struct ActionRetrier<T> {
    max_attempts: u32,
    delay: Duration,
    should_retry: Box<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> std::fmt::Debug for ActionRetrier<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRetrier")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

impl<T> ActionRetrier<T> {
    /// Creates a retrier.
    ///
    /// `should_retry` returns true while the fetched value is not settled.
    /// At least one attempt is always made.
    pub fn new(
        max_attempts: u32,
        delay: Duration,
        should_retry: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            should_retry: Box::new(should_retry),
        }
    }

    /// Creates a retrier from a [`RetryConfig`].
    pub fn from_config(
        config: &RetryConfig,
        should_retry: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::new(config.max_attempts, config.delay, should_retry)
    }

    /// Returns the attempt budget.
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Fetches values for `target` until one settles.
    ///
    /// Transient fetch errors ([`StagingError::is_retryable`]) use up an
    /// attempt and are retried; any other error is returned immediately.
    ///
    /// # Errors
    ///
    /// [`RetryError::Exhausted`] when the budget runs out on an unsettled
    /// value, [`RetryError::Failed`] when a fetch fails for good.
    pub async fn execute<F, Fut>(
        &self,
        target: &str,
        mut fetch: F,
    ) -> Result<RetryOutcome<T>, RetryError<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StagingError>>,
    {
        let mut attempts = 0;

        loop {
            attempts += 1;

            match fetch().await {
                Ok(value) if !(self.should_retry)(&value) => {
                    return Ok(RetryOutcome { value, attempts });
                }
                Ok(last) => {
                    if attempts >= self.max_attempts {
                        return Err(RetryError::Exhausted { last, attempts });
                    }
                    tracing::debug!(
                        target_id = target,
                        attempt = attempts,
                        max_attempts = self.max_attempts,
                        "not settled yet, retrying"
                    );
                }
                Err(error) if error.is_retryable() && attempts < self.max_attempts => {
                    tracing::warn!(
                        target_id = target,
                        attempt = attempts,
                        error = %error,
                        "transient failure, retrying"
                    );
                }
                Err(error) => return Err(RetryError::Failed { error, attempts }),
            }

            tokio::time::sleep(self.delay).await;
        }
    }
}
