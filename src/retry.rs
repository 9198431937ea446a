//! Retry logic with a fixed delay between attempts
//!
//! The debrid API throttles aggressively and answers HTTP 429 when a client
//! goes too fast. Calls that must eventually land (such as selecting files for
//! a freshly added torrent) are wrapped in [`retry_with_fixed_delay`], which
//! re-runs the operation while its error is classified as retryable.
//!
//! # Example
//!
//! ```no_run
//! use debrid_tracker::retry::{IsRetryable, retry_with_fixed_delay};
//! use debrid_tracker::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Throttled,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{:?}", self)
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Throttled)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! retry_with_fixed_delay(&config, |_attempt| async {
//!     // Your operation here
//!     Ok::<_, MyError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use std::future::Future;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

/// Only throttling responses are worth waiting out; every other failure is
/// left to the next reconciliation sweep.
impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        self.is_rate_limited()
    }
}

/// Execute an async operation, retrying retryable failures after a fixed delay
///
/// The operation receives the 1-based attempt number. At most
/// `config.max_attempts` attempts are made and the delay is only slept between
/// attempts, never after the last one.
///
/// # Returns
///
/// The first successful result, the first non-retryable error, or the last
/// retryable error once attempts are exhausted.
pub async fn retry_with_fixed_delay<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    delay_ms = config.delay.as_millis(),
                    "Operation throttled, retrying"
                );

                tokio::time::sleep(config.delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt,
                        "Operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(
                        error = %e,
                        "Operation failed with non-retryable error"
                    );
                }
                return Err(e);
            }
        }
    }
}
