use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{error, warn};

const DEFAULT_MULTIPLIER: f64 = 1.0;
const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(2);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);

/// Bounded exponential backoff.
///
/// The wait after failed attempt `n` (1-based) is
/// `multiplier * 2^(n-1)` seconds clamped to `[min_delay, max_delay]`, which
/// with the defaults gives 2, 2, 4, 8, 10, 10, ... seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Never zero.
    pub max_attempts: u32,
    pub multiplier: f64,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_max_retries(crate::config::settings::DEFAULT_MAX_RETRIES)
    }
}

impl RetryPolicy {
    /// `max_retries` counts the retries after the first attempt.
    pub fn from_max_retries(max_retries: u32) -> Self {
        Self {
            max_attempts: max_retries.saturating_add(1),
            multiplier: DEFAULT_MULTIPLIER,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    pub fn with_delay_bounds(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay.max(min_delay);
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Wait before the attempt that follows failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(62) as i32;
        let raw = self.multiplier * 2f64.powi(exponent);
        let secs = raw
            .max(self.min_delay.as_secs_f64())
            .min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Run `operation` until it succeeds, fails with an error `is_retryable`
    /// rejects, or the attempts run out.
    ///
    /// The closure receives the 1-based attempt number. The final error is
    /// returned exactly as the operation produced it.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        operation_name: &str,
        is_retryable: P,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if !is_retryable(&e) => return Err(e),
                Err(e) if attempt >= max_attempts => {
                    error!(
                        operation = operation_name,
                        attempts = attempt,
                        "GenAI request failed after {} attempts, error: {}",
                        attempt,
                        e
                    );
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation = operation_name,
                        delay_ms = delay.as_millis() as u64,
                        "GenAI request failed, retrying ({}/{}), error: {}",
                        attempt,
                        max_attempts,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
