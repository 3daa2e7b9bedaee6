//! Bounded retry with exponential backoff for external calls.
//!
//! Every network collaborator (reference lookups, narrative generation) goes
//! through [`with_retry`]: each attempt is bounded by a timeout, transient
//! failures are retried with an exponentially growing delay, permanent
//! failures return immediately, and cancellation stops new attempts from
//! starting.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// An error that the retry loop knows how to classify.
pub trait Retryable: Sized {
    /// Whether another attempt may succeed.
    fn is_transient(&self) -> bool;

    /// Server-supplied minimum delay before the next attempt.
    fn retry_after(&self) -> Option<Duration> {
        None
    }

    /// The error to report when an attempt exceeds its timeout.
    fn timed_out(after: Duration) -> Self;

    /// The error to report when the run was cancelled before an attempt.
    fn cancelled() -> Self;
}

/// Attempt count, per-attempt timeout and backoff curve.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Timeout applied to every individual attempt.
    pub attempt_timeout: Duration,
    /// Delay after the first failed attempt.
    pub initial_backoff: Duration,
    /// Growth factor applied per failed attempt.
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(60),
            initial_backoff: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after `attempt` (zero-based) failed.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let base = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let capped = base.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Why [`with_retry`] gave up.
#[derive(Debug, Clone)]
pub struct RetryFailure<E> {
    /// How many attempts were actually issued.
    pub attempts: u32,
    /// The error from the final attempt.
    pub error: E,
}

/// Run `operation` under `policy`, returning the first success.
///
/// `label` only appears in log lines.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    label: &str,
    mut operation: F,
) -> Result<T, RetryFailure<E>>
where
    E: Retryable + std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(RetryFailure {
                attempts,
                error: E::cancelled(),
            });
        }

        let attempt = attempts;
        attempts += 1;

        let outcome = match tokio::time::timeout(policy.attempt_timeout, operation(attempt)).await
        {
            Ok(result) => result,
            Err(_) => Err(E::timed_out(policy.attempt_timeout)),
        };

        let error = match outcome {
            Ok(value) => {
                debug!(label, attempts, "Call succeeded");
                return Ok(value);
            }
            Err(e) => e,
        };

        if !error.is_transient() || attempts >= max_attempts {
            return Err(RetryFailure { attempts, error });
        }

        let mut delay = policy.backoff_for(attempt);
        if let Some(hint) = error.retry_after() {
            delay = delay.max(hint);
        }

        warn!(
            label,
            attempt = attempts,
            max = max_attempts,
            backoff_ms = delay.as_millis() as u64,
            error = %error,
            "Retrying after transient error"
        );

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = cancel.cancelled() => {
                return Err(RetryFailure {
                    attempts,
                    error: E::cancelled(),
                });
            }
        }
    }
}
