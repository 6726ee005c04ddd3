// Retry policy for establishing the store connection.
//
// Only the initial connection is retried. The sleep is behind a trait so tests
// can count delays without waiting for them.

use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Something that can wait for a duration.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real sleeper backed by the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Fixed-delay retry: `max_attempts` tries in total, `delay` between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `operation` until it succeeds or the attempts are used up.
    ///
    /// The closure receives the 1-based attempt number. On exhaustion the
    /// last error is returned. A policy of zero attempts still tries once.
    pub async fn run<T, E, F, Fut>(&self, sleeper: &dyn Sleeper, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            tracing::info!(attempt, max_attempts, "Attempting connection");

            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => {
                    tracing::error!("All {} connection attempts failed: {}", max_attempts, e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(attempt, "Connection attempt failed: {}", e);
                    sleeper.sleep(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records requested sleeps instead of waiting.
    #[derive(Default)]
    pub(crate) struct RecordingSleeper {
        pub(crate) sleeps: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.sleeps.lock().unwrap().push(duration);
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::default();
        let mut calls = 0;

        let result: Result<&str, String> = policy
            .run(&sleeper, |attempt| {
                calls += 1;
                async move {
                    if attempt < 3 {
                        Err(format!("transient failure {attempt}"))
                    } else {
                        Ok("connected")
                    }
                }
            })
            .await;

        assert_eq!(result, Ok("connected"));
        assert_eq!(calls, 3);
        assert_eq!(
            *sleeper.sleeps.lock().unwrap(),
            vec![Duration::from_secs(5), Duration::from_secs(5)]
        );
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::default();
        let mut calls = 0;

        let result: Result<(), String> = policy
            .run(&sleeper, |attempt| {
                calls += 1;
                async move { Err(format!("failure {attempt}")) }
            })
            .await;

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(calls, 3);
        // No sleep after the final attempt
        assert_eq!(sleeper.sleeps.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let sleeper = RecordingSleeper::default();
        let policy = RetryPolicy::new(0, Duration::from_millis(1));
        let mut calls = 0;

        let result: Result<(), String> = policy
            .run(&sleeper, |_| {
                calls += 1;
                async { Err("nope".to_string()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
        assert!(sleeper.sleeps.lock().unwrap().is_empty());
    }
}
