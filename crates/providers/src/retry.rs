//! Configurable retry policy for chain reads.

use std::time::Duration;

/// The default number of retries after the first attempt.
const DEFAULT_MAX_RETRIES: usize = 4;

/// The default delay between attempts, in milliseconds.
const DEFAULT_DELAY_MS: u64 = 500;

/// A type used for retrying transient failures in chain reads. Attempts are spaced by a fixed
/// delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retry {
    /// Maximum number of retry attempts after the first one.
    pub max_retries: usize,
    /// Delay between attempts in milliseconds.
    pub delay_ms: u64,
}

impl Default for Retry {
    /// Five attempts in total, 500ms apart.
    fn default() -> Self {
        Self { max_retries: DEFAULT_MAX_RETRIES, delay_ms: DEFAULT_DELAY_MS }
    }
}

impl Retry {
    /// Creates a new [`Retry`] with the specified parameters.
    pub const fn new(max_retries: usize, delay_ms: u64) -> Self {
        Self { max_retries, delay_ms }
    }

    /// Returns the total number of attempts.
    pub const fn max_attempts(&self) -> usize {
        self.max_retries + 1
    }

    /// Retry an asynchronous operation with the configured retry strategy.
    pub async fn retry<F, Fut, T, E>(&self, operation_name: &str, operation: F) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: std::fmt::Debug,
    {
        let mut attempt: usize = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    if attempt >= self.max_retries {
                        return Err(error);
                    }

                    attempt += 1;
                    tracing::debug!(
                        target: "bridge::providers",
                        operation = operation_name,
                        error = ?error,
                        attempt = attempt,
                        "Retrying operation"
                    );

                    tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Retry;
    use std::{cell::RefCell, time::Duration};

    #[tokio::test]
    async fn test_retry_success_on_first_attempt() {
        let attempt = RefCell::new(0);
        let retry = Retry::new(3, 10);
        let result = retry
            .retry("test_operation", || {
                *attempt.borrow_mut() += 1;
                async move { Ok::<i32, &str>(42) }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(*attempt.borrow(), 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failures() {
        let attempt = RefCell::new(0);
        let retry = Retry::new(5, 10);
        let result = retry
            .retry("test_operation", || {
                *attempt.borrow_mut() += 1;
                let current_attempt = *attempt.borrow();
                async move {
                    if current_attempt < 3 {
                        Err::<i32, &str>("failed")
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result, Ok(42));
        assert_eq!(*attempt.borrow(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_policy_makes_five_attempts_500ms_apart() {
        let attempts = RefCell::new(Vec::new());
        let start = tokio::time::Instant::now();
        let result = Retry::default()
            .retry("always_fails", || {
                attempts.borrow_mut().push(start.elapsed());
                async move { Err::<i32, &str>("always fails") }
            })
            .await;

        assert_eq!(result, Err("always fails"));
        let attempts = attempts.into_inner();
        assert_eq!(attempts.len(), 5);
        for pair in attempts.windows(2) {
            let delay = pair[1] - pair[0];
            assert!(delay >= Duration::from_millis(500) && delay < Duration::from_millis(505));
        }
        assert_eq!(Retry::default().max_attempts(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_stop_after_max_attempts() {
        let attempt = RefCell::new(0);
        let result = Retry::new(2, 100)
            .retry("always_fails", || {
                *attempt.borrow_mut() += 1;
                async move { Err::<(), &str>("always fails") }
            })
            .await;

        assert_eq!(result, Err("always fails"));
        assert_eq!(*attempt.borrow(), 3);
    }
}
