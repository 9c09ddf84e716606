//! Retry logic with linear backoff
//!
//! Backoff is linear rather than exponential: the k-th retry waits
//! `base_delay * k`, which keeps the worst-case total latency of one logical
//! request predictable (`base_delay * max_retries * (max_retries + 1) / 2`
//! plus the attempts themselves).

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::config::RetryConfig;
use crate::{Error, Result};

/// Retry policy configuration
#[derive(Clone)]
pub struct RetryPolicy {
    /// Whether retries are enabled
    pub enabled: bool,
    /// Maximum additional attempts after the first
    pub max_retries: u32,
    /// Base backoff delay
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create from config
    #[must_use]
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
        }
    }
}

/// Execute a future with bounded linear-backoff retries.
///
/// An attempt counts as failed on a transport error or a non-success upstream
/// status; structurally successful responses are never retried, whatever
/// their payload. Non-retryable errors are returned as-is on the first
/// attempt.
///
/// # Errors
///
/// [`Error::RetriesExhausted`] wrapping the last failure once the budget is
/// spent, or the original error if it is not retryable.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, name: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if !policy.enabled {
        return f().await;
    }

    let mut attempts = 0u32;

    loop {
        attempts += 1;

        match f().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !is_retryable(&e) {
                    return Err(e);
                }

                if attempts > policy.max_retries {
                    debug!(
                        operation = name,
                        attempts,
                        error = %e,
                        "Retry budget exhausted"
                    );
                    return Err(Error::RetriesExhausted {
                        attempts,
                        source: Box::new(e),
                    });
                }

                let delay = policy.base_delay * attempts;
                let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                debug!(
                    operation = name,
                    attempt = attempts,
                    delay_ms,
                    error = %e,
                    "Retrying after backoff"
                );
                sleep(delay).await;
            }
        }
    }
}

/// Check if an error is retryable
fn is_retryable(error: &Error) -> bool {
    matches!(
        error,
        Error::Transport(_) | Error::UpstreamStatus { .. } | Error::Io(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy {
            enabled: true,
            max_retries: 2,
            base_delay: Duration::from_millis(100),
        }
    }

    fn transport_err() -> Error {
        Error::Transport("connection refused".to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let started = Instant::now();
        let result = with_retry(&policy(), "addEvent", move || {
            let counter = Arc::clone(&counter);
            async move {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= 2 { Err(transport_err()) } else { Ok(n) }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Linear backoff under the paused clock: 100ms + 200ms
        assert_eq!(started.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_wraps_last_cause() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let err = with_retry(&policy(), "addEvent", move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::UpstreamStatus {
                    status: 502,
                    path: "/addEvent".to_string(),
                })
            }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            Error::RetriesExhausted { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(matches!(*source, Error::UpstreamStatus { status: 502, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_errors_return_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let err = with_retry(&policy(), "addEvent", move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::Internal("boom".to_string()))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, Error::Internal(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn disabled_policy_makes_single_attempt() {
        let disabled = RetryPolicy {
            enabled: false,
            ..policy()
        };
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let err = with_retry(&disabled, "addEvent", move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(transport_err())
            }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, Error::Transport(_)));
    }
}
