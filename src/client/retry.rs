use std::future::Future;
use anyhow::{anyhow, Result};
use tokio::time::{sleep, Duration};
use rand::Rng;

use crate::logging::{obj, v_num, v_str, warn, Domain};

/// Retry configuration
#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
            jitter_factor: 0.3,
        }
    }
}

impl RetryConfig {
    /// No retries at all.
    pub fn none() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    /// Calculate delay with exponential backoff and jitter
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms as f64 * 2.0_f64.powi(attempt as i32);
        let clamped = base.min(self.max_delay_ms as f64);

        let jitter_range = clamped * self.jitter_factor;
        let jitter: f64 = if jitter_range > 0.0 {
            rand::thread_rng().gen_range(-jitter_range..=jitter_range)
        } else {
            0.0
        };
        let final_delay = (clamped + jitter).max(0.0);

        Duration::from_millis(final_delay as u64)
    }
}

/// Retry a fallible async operation with exponential backoff.
/// Errors that [`is_retryable`] rejects are returned immediately.
pub async fn retry_async<F, Fut, T>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error: Option<anyhow::Error> = None;

    for attempt in 0..=config.max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !is_retryable(&e) {
                    return Err(e);
                }
                if attempt < config.max_retries {
                    let delay = config.delay_for_attempt(attempt);
                    warn(
                        Domain::System,
                        "retry",
                        obj(&[
                            ("operation", v_str(operation_name)),
                            ("attempt", v_num((attempt + 1) as f64)),
                            ("max_attempts", v_num((config.max_retries + 1) as f64)),
                            ("error", v_str(&e.to_string())),
                            ("delay_ms", v_num(delay.as_millis() as f64)),
                        ]),
                    );
                    sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow!("retry_async exhausted without error")))
}

/// Categorize errors for retry decisions
pub fn is_retryable_http_error(status: u16) -> bool {
    matches!(status,
        408 |   // Request Timeout
        429 |   // Too Many Requests
        500 |   // Internal Server Error
        502 |   // Bad Gateway
        503 |   // Service Unavailable
        504     // Gateway Timeout
    )
}

/// Categorize network errors
pub fn is_retryable_network_error(err: &reqwest::Error) -> bool {
    if let Some(status) = err.status() {
        return is_retryable_http_error(status.as_u16());
    }
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Only HTTP status errors are classified; every other failure is retried.
pub fn is_retryable(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<reqwest::Error>() {
        Some(e) if e.is_status() => is_retryable_network_error(e),
        _ => true,
    }
}
