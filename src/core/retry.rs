//! Retrying store operations
//!
//! Backlog persistence at shutdown goes through [`retry_async`] so a store
//! write that fails once (a busy file system, a flaky remote store) does not
//! lose the backlog.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Attempts and backoff for one retried operation
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_delay: Duration,
    /// Each further wait is the previous one times this factor
    pub backoff_factor: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            backoff_factor: 2,
            max_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `retry` (1-based)
    pub fn delay_before(&self, retry: usize) -> Duration {
        let mut delay = self.initial_delay;
        for _ in 1..retry {
            delay = delay.saturating_mul(self.backoff_factor.max(1));
            if delay >= self.max_delay {
                return self.max_delay;
            }
        }
        delay.min(self.max_delay)
    }
}

/// Run `operation` until it succeeds or the policy's attempts are used up
///
/// Returns the last error on exhaustion. Zero attempts still runs once.
pub async fn retry_async<F, T, E, Fut>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(result) => return Ok(result),
            Err(error) => error,
        };
        if attempt >= attempts {
            log::warn!(
                "'{}' failed after {} attempt(s): {}",
                operation_name,
                attempts,
                error
            );
            return Err(error);
        }

        let delay = policy.delay_before(attempt);
        log::debug!(
            "'{}' failed (attempt {}/{}), retrying in {:?}: {}",
            operation_name,
            attempt,
            attempts,
            delay,
            error
        );
        sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quick(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            ..RetryPolicy::default()
        }
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            initial_delay: Duration::from_millis(100),
            backoff_factor: 3,
            max_delay: Duration::from_millis(500),
        };

        assert_eq!(policy.delay_before(1), Duration::from_millis(100));
        assert_eq!(policy.delay_before(2), Duration::from_millis(300));
        assert_eq!(policy.delay_before(3), Duration::from_millis(500));
        assert_eq!(policy.delay_before(10), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_store_write_recovers_after_transient_failures() {
        let count = AtomicUsize::new(0);
        let writes = &count;

        let result = retry_async("append backlog", quick(3), move || async move {
            if writes.fetch_add(1, Ordering::SeqCst) < 2 {
                Err("store busy")
            } else {
                Ok("written")
            }
        })
        .await;

        assert_eq!(result, Ok("written"));
        assert_eq!(writes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_persistent_failure_returns_last_error() {
        let count = AtomicUsize::new(0);
        let writes = &count;

        let result = retry_async("append backlog", quick(2), move || async move {
            let n = writes.fetch_add(1, Ordering::SeqCst) + 1;
            Err::<(), String>(format!("disk full ({n})"))
        })
        .await;

        assert_eq!(result, Err("disk full (2)".to_string()));
        assert_eq!(writes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_runs_once() {
        let count = AtomicUsize::new(0);
        let writes = &count;

        let _ = retry_async("clear backlog", quick(0), move || async move {
            writes.fetch_add(1, Ordering::SeqCst);
            Err::<(), &str>("failure")
        })
        .await;

        assert_eq!(writes.load(Ordering::SeqCst), 1);
    }
}
