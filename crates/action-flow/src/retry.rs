//! Bounded retry with linear backoff

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::errors::Retryable;

/// How often and how patiently to retry one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Clicks and other single interactions: 3 attempts, 1s base delay
    pub fn click() -> Self {
        Self::new(3, Duration::from_secs(1))
    }

    /// Page navigation: 5 attempts, 1s base delay
    pub fn navigation() -> Self {
        Self::new(5, Duration::from_secs(1))
    }

    pub fn single() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Pause after failed attempt `attempt` (1-based): `base_delay * attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::click()
    }
}

/// Run `operation` until it succeeds, fails terminally or the policy runs out
///
/// The last error is returned as produced by the operation.
pub async fn with_retry<T, E, F, Fut>(
    label: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(label, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if !err.is_retryable() => {
                warn!(label, attempt, %err, "terminal failure, not retrying");
                return Err(err);
            }
            Err(err) if attempt >= max_attempts => {
                warn!(label, attempt, %err, "giving up after final attempt");
                return Err(err);
            }
            Err(err) => {
                let delay = policy.delay_for(attempt);
                info!(
                    label,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    %err,
                    "attempt failed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FlowError;
    use action_primitives::ActionError;
    use pilot_core_types::Instruction;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn linear_backoff() {
        let policy = RetryPolicy::click();
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(3));
    }

    #[test]
    fn zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
        assert_eq!(RetryPolicy::navigation().max_attempts, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_exhausted_with_linear_sleeps() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: Result<(), FlowError> = with_retry("click start", &RetryPolicy::click(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FlowError::Action(ActionError::InvokeFailed("detached".into()))) }
        })
        .await;

        assert_eq!(
            result.unwrap_err(),
            FlowError::Action(ActionError::InvokeFailed("detached".into()))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_second_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, FlowError> = with_retry("navigate", &RetryPolicy::navigation(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 2 {
                    Err(FlowError::Action(ActionError::Transport("reset".into())))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();
        let result: Result<(), FlowError> = with_retry("click", &RetryPolicy::click(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FlowError::TargetNotFound(Instruction::new("Verify"))) }
        })
        .await;

        assert!(matches!(result, Err(FlowError::TargetNotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() < Duration::from_millis(10));
    }
}
