//! Typed retry engine for destination calls.
//!
//! Transient failures are retried without an attempt ceiling; permanent
//! failures short-circuit immediately. Classification comes from
//! [`JimError::is_transient`], not from matching message strings.

use crate::error::{JimError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Pacing and retry intervals for destination traffic.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Fixed delay inserted before paced requests and between retries.
    /// A simple fixed-rate limiter, not adaptive backoff.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Sleep the fixed pacing delay.
    pub async fn pace(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// Run `operation` until it succeeds or fails permanently.
///
/// # Errors
///
/// Returns the first error for which [`JimError::is_transient`] is false.
pub async fn retry_indefinitely<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                warn!(label, attempt, %err, "transient failure; retrying");
                policy.pace().await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_past_transient_failures() {
        let policy = RetryPolicy::new(Duration::from_millis(1));
        let attempts = AtomicU32::new(0);

        let result = retry_indefinitely(&policy, "test", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(JimError::PollTimeout { seconds: 1 })
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn permanent_failure_short_circuits() {
        let policy = RetryPolicy::new(Duration::from_millis(1));
        let attempts = AtomicU32::new(0);

        let result: Result<()> = retry_indefinitely(&policy, "test", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(JimError::PermanentImport {
                    message: "no".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
