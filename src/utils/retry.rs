//! Retry utilities with a fixed delay between attempts.
//!
//! Publisher sites punish bursts, so retries wait the same polite interval
//! every time instead of backing off exponentially.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Configuration for retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Delay between two attempts
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Result of a retry operation
#[derive(Debug, PartialEq, Eq)]
pub enum RetryResult<T, E> {
    /// Operation succeeded on the given attempt
    Success(T, u32),
    /// Every attempt failed; holds the last error and the number of attempts
    Exhausted(Option<E>, u32),
}

impl<T, E> RetryResult<T, E> {
    /// Number of attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            RetryResult::Success(_, attempts) | RetryResult::Exhausted(_, attempts) => *attempts,
        }
    }

    /// Convert into a plain result, dropping the attempt count
    pub fn into_result(self) -> Result<T, Option<E>> {
        match self {
            RetryResult::Success(value, _) => Ok(value),
            RetryResult::Exhausted(error, _) => Err(error),
        }
    }
}

/// Execute an async operation up to `max_attempts` times.
///
/// Every error is retried; the fixed delay is slept between attempts but not
/// after the last one. A `max_attempts` of zero makes no attempt.
pub async fn with_retry<T, E, F, Fut>(config: RetryConfig, mut operation: F) -> RetryResult<T, E>
where
    E: std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_error = None;

    for attempt in 1..=config.max_attempts {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(
                        "Operation succeeded on attempt {} after {} failures",
                        attempt,
                        attempt - 1
                    );
                }
                return RetryResult::Success(value, attempt);
            }
            Err(error) => {
                tracing::debug!(
                    "Attempt {}/{} failed: {}",
                    attempt,
                    config.max_attempts,
                    error
                );
                last_error = Some(error);
                if attempt < config.max_attempts {
                    sleep(config.delay).await;
                }
            }
        }
    }

    if let Some(error) = &last_error {
        tracing::warn!(
            "Operation failed after {} attempts: {}",
            config.max_attempts,
            error
        );
    }
    RetryResult::Exhausted(last_error, config.max_attempts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn quick(max_attempts: u32) -> RetryConfig {
        RetryConfig::new(max_attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retry_success_first_try() {
        let call_count = Rc::new(RefCell::new(0));

        let result: RetryResult<&str, String> = {
            let call_count = call_count.clone();
            with_retry(quick(3), move |_| {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Ok("success")
                }
            })
        }
        .await;

        assert_eq!(result, RetryResult::Success("success", 1));
        assert_eq!(*call_count.borrow(), 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let result: RetryResult<u32, String> = with_retry(quick(4), |attempt| async move {
            if attempt < 3 {
                Err(format!("temporary error {}", attempt))
            } else {
                Ok(attempt)
            }
        })
        .await;

        assert_eq!(result, RetryResult::Success(3, 3));
    }

    #[tokio::test]
    async fn test_retry_stops_at_max_attempts() {
        let call_count = Rc::new(RefCell::new(0));

        let result: RetryResult<(), String> = {
            let call_count = call_count.clone();
            with_retry(quick(2), move |_| {
                let call_count = call_count.clone();
                async move {
                    *call_count.borrow_mut() += 1;
                    Err("always down".to_string())
                }
            })
        }
        .await;

        assert_eq!(*call_count.borrow(), 2);
        assert_eq!(result.attempts(), 2);
        assert_eq!(result.into_result(), Err(Some("always down".to_string())));
    }

    #[tokio::test]
    async fn test_zero_attempts_makes_no_call() {
        let result: RetryResult<(), String> =
            with_retry(quick(0), |_| async { Err::<(), String>("never called".to_string()) }).await;
        assert_eq!(result, RetryResult::Exhausted(None, 0));
    }
}
