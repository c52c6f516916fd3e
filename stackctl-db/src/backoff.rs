//! Exponential backoff between retry attempts.

use std::time::Duration;

use tracing::info;

/// Base delay in seconds; attempt `n` waits `RETRY_DELAY_SECS ** n`.
pub const RETRY_DELAY_SECS: f64 = 0.1;

/// Delay for a 1-indexed attempt number: `base_secs ** attempt`.
pub fn backoff_delay(base_secs: f64, attempt: u32) -> Duration {
    Duration::from_secs_f64(base_secs.powi(attempt as i32))
}

/// Log and suspend for the attempt's backoff delay.
///
/// Yields to the runtime for the duration; never busy-waits.
pub async fn sleep_with_backoff(attempt: u32) {
    let delay = backoff_delay(RETRY_DELAY_SECS, attempt);
    info!(
        attempt,
        delay_ms = delay.as_millis() as u64,
        "retrying after backoff"
    );
    tokio::time::sleep(delay).await;
}
