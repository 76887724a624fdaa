// file: src/utils/retry.rs
// version: 1.0.0
// guid: 3f9b2c71-5d0e-4a86-9c1b-7e24d8a0f613

//! Retry helpers

use crate::Result;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry an operation with exponential backoff.
///
/// `max_attempts` counts the first try. The delay doubles after every
/// failure and is capped at 60 seconds. The last error is returned as-is.
pub async fn retry_with_backoff<F, Fut, T>(
    operation: F,
    max_attempts: u32,
    initial_delay: Duration,
    description: &str,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut delay = initial_delay;
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!("Operation succeeded on attempt {}: {}", attempt, description);
                }
                return Ok(result);
            }
            Err(e) if attempt >= max_attempts => {
                warn!(
                    "Operation failed after {} attempts: {}: {}",
                    attempt, description, e
                );
                return Err(e);
            }
            Err(e) => {
                warn!(
                    "Operation failed on attempt {}/{}: {}: {} - retrying in {:?}",
                    attempt, max_attempts, description, e, delay
                );
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(60));
                attempt += 1;
            }
        }
    }
}
