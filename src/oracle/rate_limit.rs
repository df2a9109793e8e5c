//! Fixed-window rate limiter for quote fetches
//!
//! Calls are counted in batches. Once a batch is full, the next call waits
//! until the batch's window has elapsed before starting a new batch.

use tokio::time::{sleep, Duration, Instant};
use tracing::info;

use crate::config::FetchConfig;

#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    window: Duration,
    calls_in_batch: usize,
    batch_start: Option<Instant>,
}

impl RateLimiter {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            max_calls: max_calls.max(1),
            window,
            calls_in_batch: 0,
            batch_start: None,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            config.max_calls_per_window,
            Duration::from_secs(config.window_secs),
        )
    }

    /// Wait, if needed, until another call is allowed.
    ///
    /// Returns how long the call was held back, if at all.
    pub async fn acquire(&mut self) -> Option<Duration> {
        let mut waited = None;

        if self.calls_in_batch >= self.max_calls {
            if let Some(start) = self.batch_start {
                let elapsed = start.elapsed();
                if elapsed < self.window {
                    let remaining = self.window - elapsed;
                    info!(
                        wait_secs = remaining.as_secs_f64(),
                        max_calls = self.max_calls,
                        "Rate limit reached, waiting for window to close"
                    );
                    sleep(remaining).await;
                    waited = Some(remaining);
                }
            }
            self.calls_in_batch = 0;
        }

        if self.calls_in_batch == 0 {
            self.batch_start = Some(Instant::now());
        }
        self.calls_in_batch += 1;

        waited
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60)) // 5 calls per 60s
    }
}
