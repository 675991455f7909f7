//! Backoff retries for read operations.
//!
//! Only [`AppError::Connectivity`] failures are retried. Writes never go
//! through here.

use std::future::Future;
use std::iter::Take;
use std::time::Duration;

use tokio_retry::RetryIf;
use tokio_retry::strategy::ExponentialBackoff;

use crate::error::AppError;

/// How many times, and how patiently, a read is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRetryPolicy {
    /// Retries after the first attempt. `0` disables retrying.
    pub attempts: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReadRetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl ReadRetryPolicy {
    pub fn disabled() -> Self {
        Self {
            attempts: 0,
            ..Self::default()
        }
    }

    /// Delays of `base, 2*base, 4*base, ...` capped at `max_delay`.
    fn strategy(&self) -> Take<ExponentialBackoff> {
        let base_ms = u64::try_from(self.base_delay.as_millis())
            .unwrap_or(u64::MAX)
            .max(1);
        ExponentialBackoff::from_millis(2)
            .factor(base_ms / 2 + base_ms % 2)
            .max_delay(self.max_delay)
            .take(self.attempts)
    }
}

/// Runs `op`, retrying it with backoff while it fails with a connectivity error.
///
/// # Errors
///
/// Returns the last error once retries are exhausted, or the first
/// non-retryable error immediately.
pub async fn retry_read<T, F, Fut>(policy: ReadRetryPolicy, mut op: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 0usize;
    RetryIf::spawn(
        policy.strategy(),
        || {
            attempt += 1;
            if attempt > 1 {
                tracing::warn!(attempt, "Retrying attendance read after connectivity failure");
            }
            op()
        },
        |e: &AppError| e.is_retryable_read(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(attempts: usize) -> ReadRetryPolicy {
        ReadRetryPolicy {
            attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_retries_connectivity_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));

        let result = retry_read(fast_policy(3), || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(AppError::connectivity("down", json!({})))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));

        let result: Result<(), AppError> = retry_read(fast_policy(2), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::connectivity("down", json!({})))
            }
        })
        .await;

        assert!(matches!(result, Err(AppError::Connectivity { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_other_errors() {
        let calls = Arc::new(AtomicUsize::new(0));

        let result: Result<(), AppError> = retry_read(fast_policy(5), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::bad_request("bad", json!({})))
            }
        })
        .await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_policy_tries_once() {
        let calls = Arc::new(AtomicUsize::new(0));

        let result: Result<(), AppError> = retry_read(ReadRetryPolicy::disabled(), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::connectivity("down", json!({})))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
