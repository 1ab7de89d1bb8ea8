//! Retry with exponential backoff, driven by provider error codes.

use monad_core::ProviderResult;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// How often and how patiently a call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base: Duration,
    /// Upper bound on any single delay.
    pub cap: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base: Duration, cap: Duration) -> Self {
        Self {
            max_attempts,
            base,
            cap,
        }
    }

    /// Retry without waiting.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, Duration::ZERO)
    }

    /// Delay before retry `attempt` (1-indexed): `base * 2^(attempt-1)`, capped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base.saturating_mul(multiplier).min(self.cap)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(15, Duration::from_millis(500), Duration::from_secs(10))
    }
}

/// Run `op` until it succeeds, fails with a code not in `codes`, or the
/// policy runs out of attempts. The last error is returned.
pub async fn with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    codes: &[&str],
    mut op: F,
) -> ProviderResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ProviderResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(err) if err.is_any(codes) && attempt < policy.max_attempts => {
                let delay = policy.delay_for_attempt(attempt);
                debug!(code = %err.code, attempt, ?delay, "Retrying provider call");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monad_core::ProviderError;
    use monad_core::error::codes;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::new(15, Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(800));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_secs(1));
    }

    #[test]
    fn test_default_attempts() {
        assert_eq!(RetryPolicy::default().max_attempts, 15);
    }

    #[tokio::test]
    async fn test_retries_listed_code_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_backoff(
            &RetryPolicy::immediate(15),
            &[codes::RESOURCE_CONFLICT],
            || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(ProviderError::new(codes::RESOURCE_CONFLICT, "busy"))
                } else {
                    Ok("done")
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: ProviderResult<()> = with_backoff(
            &RetryPolicy::immediate(3),
            &[codes::INVALID_PARAMETER_VALUE],
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::new(codes::INVALID_PARAMETER_VALUE, "role not ready"))
            },
        )
        .await;
        assert!(result.unwrap_err().is(codes::INVALID_PARAMETER_VALUE));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_codes_fail_immediately() {
        let calls = AtomicU32::new(0);
        let result: ProviderResult<()> = with_backoff(
            &RetryPolicy::immediate(15),
            &[codes::RESOURCE_CONFLICT],
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::new("AccessDeniedException", "no"))
            },
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
