use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffStrategy {
    Exponential { base_ms: u64, max_ms: u64 },
    Linear { step_ms: u64, max_ms: u64 },
    Fixed { ms: u64 },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Fixed { ms: 1_000 }
    }
}

impl BackoffStrategy {
    pub fn delay(&self, tries: u32) -> Duration {
        let tries = tries.max(1);
        let millis = match *self {
            Self::Exponential { base_ms, max_ms } => base_ms
                .saturating_mul(1_u64 << (tries - 1).min(32))
                .min(max_ms),
            Self::Linear { step_ms, max_ms } => step_ms.saturating_mul(tries as u64).min(max_ms),
            Self::Fixed { ms } => ms,
        };

        // Small positive jitter to avoid synchronized retries.
        let jitter = if millis >= 10 {
            rand::thread_rng().gen_range(0..=millis / 10)
        } else {
            0
        };
        Duration::from_millis(millis.saturating_add(jitter))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: BackoffStrategy::default(),
        }
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or `policy.attempts` is used up.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < attempts => {
                warn!(label, attempt, attempts, error = %err, "attempt failed, retrying");
                tokio::time::sleep(policy.backoff.delay(attempt)).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::{retry, BackoffStrategy, RetryPolicy};
    use crate::error::SwapError;

    #[test]
    fn backoff_delays_stay_within_jitter_bounds() {
        let fixed = BackoffStrategy::Fixed { ms: 1_000 };
        let delay = fixed.delay(3);
        assert!(delay >= Duration::from_millis(1_000));
        assert!(delay <= Duration::from_millis(1_100));

        let exponential = BackoffStrategy::Exponential {
            base_ms: 100,
            max_ms: 500,
        };
        assert!(exponential.delay(2) >= Duration::from_millis(200));
        assert!(exponential.delay(10) <= Duration::from_millis(550));

        let linear = BackoffStrategy::Linear {
            step_ms: 0,
            max_ms: 0,
        };
        assert_eq!(linear.delay(4), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transport_errors_up_to_the_attempt_budget() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::default();

        let err = retry(&policy, "getLatestBlockhash", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(SwapError::Transport("connection reset".to_string()))
        })
        .await
        .expect_err("every attempt fails");

        assert!(matches!(err, SwapError::Transport(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let value = retry(&RetryPolicy::default(), "getLatestBlockhash", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(SwapError::Timeout)
            } else {
                Ok("hash")
            }
        })
        .await
        .expect("second attempt succeeds");

        assert_eq!(value, "hash");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_rpc_errors() {
        let calls = AtomicU32::new(0);
        let counter = &calls;

        let err = retry(&RetryPolicy::default(), "sendTransaction", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(SwapError::Rpc {
                code: -32002,
                message: "Transaction simulation failed".to_string(),
                data: None,
            })
        })
        .await
        .expect_err("rpc errors are returned directly");

        assert!(matches!(err, SwapError::Rpc { code: -32002, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
