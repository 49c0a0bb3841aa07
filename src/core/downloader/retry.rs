//! Fixed-budget retry for transient transport failures.
//!
//! Integrity mismatches, 4xx responses and filesystem errors are never
//! retried; see [`LauncherError::is_transient`].

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

/// Default number of attempts, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default pause between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `operation` until it succeeds, fails permanently, or the attempt
    /// budget is spent. Exhaustion is promoted to an unrecoverable error.
    pub async fn run<T, F, Fut>(&self, url: &str, mut operation: F) -> LauncherResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = LauncherResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= self.max_attempts => {
                    warn!("Giving up on {} after {} attempts: {}", url, attempt, e);
                    return Err(LauncherError::RetriesExhausted {
                        url: url.to_string(),
                        attempts: attempt,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => {
                    debug!(
                        "Transient failure on {} (attempt {}/{}): {}",
                        url, attempt, self.max_attempts, e
                    );
                    tokio::time::sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> LauncherError {
        LauncherError::DownloadFailed {
            url: "u".into(),
            status: 503,
        }
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(3, Duration::from_millis(1));

        let result = policy
            .run("u", move |_| async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(unavailable())
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_budget_is_promoted_to_permanent() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(2, Duration::from_millis(1));

        let err = policy
            .run("u", move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(unavailable())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::RetriesExhausted { attempts: 2, .. }));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::new(5, Duration::from_millis(1));

        let err = policy
            .run("u", move |_| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(LauncherError::Sha1Mismatch {
                    path: "x".into(),
                    expected: "a".into(),
                    actual: "b".into(),
                })
            })
            .await
            .unwrap_err();

        assert_eq!(err.key(), "download.integrity");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
