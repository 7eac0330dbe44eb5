//! Bounded retry with exponential backoff
//!
//! Wraps a caller-supplied async operation (typically a remote model call) in
//! a retry loop with a hard attempt bound. Errors are classified through
//! [`Retryable`]: throttling/connectivity failures are retried after an
//! exponentially growing delay, everything else fails fast with zero delay.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Classification hook for operation errors.
///
/// An error is retryable iff it signals transient backend overload or a
/// transport-level connectivity failure. Malformed requests, permission
/// failures and any other error must report `false`.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Immutable retry configuration.
///
/// The delay before re-running attempt `n + 1` is `base_delay * 2^n`; no
/// delay is ever applied after the final attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` is normalized to at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Backoff delay applied after the 0-indexed `attempt` fails.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Terminal outcome of a failed retry loop.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Every attempt failed with a retryable error.
    #[error("operation failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },

    /// An attempt failed with a non-retryable error; no further attempts
    /// were made and no delay was applied.
    #[error("operation failed on attempt {attempts}: {source}")]
    Fatal {
        attempts: u32,
        #[source]
        source: E,
    },
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Number of attempts executed before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } | RetryError::Fatal { attempts, .. } => {
                *attempts
            }
        }
    }

    /// Recover the terminal underlying error.
    pub fn into_source(self) -> E {
        match self {
            RetryError::Exhausted { source, .. } | RetryError::Fatal { source, .. } => source,
        }
    }
}

/// Run `operation` under `policy`, returning the first success.
///
/// The backoff sleep is a plain `tokio::time::sleep`, so an in-flight wait is
/// cancelled cleanly when the caller drops the future.
pub async fn invoke<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::error::Error + 'static,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(source) if !source.is_retryable() => {
                return Err(RetryError::Fatal {
                    attempts: attempt + 1,
                    source,
                });
            }
            Err(source) => {
                attempt += 1;
                if attempt >= policy.max_attempts() {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        source,
                    });
                }
                let delay = policy.delay_for(attempt - 1);
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts(),
                    delay_secs = delay.as_secs_f64(),
                    error = %source,
                    "Retryable failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
