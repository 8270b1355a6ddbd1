//! Fixed-interval rate limiting
//!
//! A [`RateLimiter`] owns its last-call timestamp. The orchestrator that holds
//! it is the only caller, so no locking is needed.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Longest interval a limiter will enforce between calls
pub const MAX_INTERVAL: Duration = Duration::from_secs(86_400);

/// Enforces a minimum interval of `1 / calls_per_second` between calls
///
/// The interval is measured from the moment the previous call *returned*.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    /// Creates a limiter allowing `calls_per_second` calls per second
    ///
    /// Non-positive or non-finite rates disable throttling. Rates slower than
    /// one call per [`MAX_INTERVAL`] are clamped to it.
    pub fn new(calls_per_second: f64) -> Self {
        let min_interval = if calls_per_second.is_finite() && calls_per_second > 0.0 {
            match Duration::try_from_secs_f64(1.0 / calls_per_second) {
                Ok(interval) if interval <= MAX_INTERVAL => interval,
                _ => {
                    tracing::warn!(
                        "Rate of {} calls/sec is too slow, using one call per {:?}",
                        calls_per_second,
                        MAX_INTERVAL
                    );
                    MAX_INTERVAL
                }
            }
        } else {
            Duration::ZERO
        };

        Self {
            min_interval,
            last_call: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Sleeps until the minimum interval since the previous call has elapsed
    pub async fn wait(&self) {
        if let Some(last) = self.last_call {
            let ready_at = last + self.min_interval;
            if ready_at > Instant::now() {
                tracing::trace!("Rate limiter waiting {:?}", ready_at - Instant::now());
                sleep_until(ready_at).await;
            }
        }
    }

    /// Records that a call just returned
    pub fn mark(&mut self) {
        self.last_call = Some(Instant::now());
    }

    /// Runs `operation` once the interval has elapsed, then records its return time
    pub async fn run<F, Fut, T>(&mut self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.wait().await;
        let output = operation().await;
        self.mark();
        output
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(1.0)
    }
}
