//! Bounded retry with exponential backoff.
//!
//! Failures never escape the loop: the caller either gets the value or
//! [`Outcome::Unavailable`], and decides how to degrade.

use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Sleep after the first failure; doubles after every later one.
    pub initial_delay: Duration,
}

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Worth another try after a pause (network, timeout, 5xx).
    Transient(String),
    /// Retrying cannot help (bad credentials, malformed request).
    Permanent(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    Unavailable,
}

/// Runs `op` until it succeeds, fails permanently, or the policy's attempts
/// run out. `op` receives the 1-based attempt number.
pub async fn with_backoff<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Outcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AttemptError>>,
{
    let mut delay = policy.initial_delay;

    for attempt in 1..=policy.max_attempts {
        match op(attempt).await {
            Ok(value) => return Outcome::Completed(value),
            Err(AttemptError::Permanent(reason)) => {
                warn!(attempt, %reason, "request rejected, not retrying");
                return Outcome::Unavailable;
            }
            Err(AttemptError::Transient(reason)) => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    %reason,
                    "request failed"
                );
                if attempt < policy.max_attempts {
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }

    error!(
        attempts = policy.max_attempts,
        "request failed after all retries, operating in fallback mode"
    );
    Outcome::Unavailable
}
