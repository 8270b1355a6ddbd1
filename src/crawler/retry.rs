//! Retry with exponential backoff
//!
//! # Retry Logic
//!
//! | Attempt | Sleep before next attempt |
//! |---------|---------------------------|
//! | 1 fails | `initial_delay` |
//! | 2 fails | `initial_delay * backoff` |
//! | n fails | `initial_delay * backoff^(n-1)` |
//! | `max_attempts` fails | none, the last error is returned unchanged |
//!
//! Every sleep is capped at [`MAX_RETRY_DELAY`]. There is no jitter and no
//! circuit breaker.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Upper bound on a single backoff sleep
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(3600);

/// Retry budget for a fallible async operation
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    backoff: f64,
}

impl RetryPolicy {
    /// Creates a policy allowing `max_attempts` total attempts (at least one)
    pub fn new(max_attempts: u32, initial_delay: Duration, backoff: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff: if backoff.is_finite() && backoff > 0.0 {
                backoff
            } else {
                1.0
            },
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The sleep that follows the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .map_or(MAX_RETRY_DELAY, |delay| delay.min(MAX_RETRY_DELAY))
    }

    /// Runs `operation` until it succeeds or the attempt budget is spent
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The first successful result
    /// * `Err(E)` - The error of the final attempt, unchanged
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_while(operation, |_| true).await
    }

    /// Like [`run`](Self::run), but stops early on errors `retryable` rejects
    pub async fn run_while<T, E, F, Fut, P>(&self, mut operation: F, retryable: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: Fn(&E) -> bool,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => {
                    tracing::debug!("Giving up after {} attempt(s): {}", attempt, e);
                    return Err(e);
                }
                Err(e) if !retryable(&e) => {
                    tracing::debug!("Not retrying permanent failure: {}", e);
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        "Attempt {} failed: {}. Retrying in {:?}...",
                        attempt,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), 2.0)
    }
}
