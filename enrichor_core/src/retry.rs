use std::fmt::Display;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Exponential backoff schedule: `base_delay * 2^n`, capped at `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Result of a retried operation and how many attempts it took.
#[derive(Debug)]
pub struct RetryReport<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
}

impl<T, E> RetryReport<T, E> {
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

/// Retry an async operation with exponential backoff.
///
/// # Arguments
/// * `operation` - The async operation to retry; every `Err` is retried
/// * `policy` - How many retries to allow and how long to wait between them
///
/// # Returns
/// The first success, or the last error once `policy.max_retries` retries
/// have failed, together with the number of attempts made.
pub async fn retry_with_backoff<F, Fut, T, E>(
    mut operation: F,
    policy: &RetryPolicy,
) -> RetryReport<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_retries.saturating_add(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => {
                return RetryReport {
                    result: Ok(value),
                    attempts: attempt,
                };
            }
            Err(e) if attempt < max_attempts => {
                let delay = policy.delay_for(attempt - 1);
                warn!(
                    "Request failed (attempt {}/{}): {e}. Retrying after {}ms...",
                    attempt,
                    max_attempts,
                    delay.as_millis()
                );
                sleep(delay).await;
            }
            Err(e) => {
                return RetryReport {
                    result: Err(e),
                    attempts: attempt,
                };
            }
        }
    }
}
