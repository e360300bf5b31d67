//! Retry helpers for the document client.

use std::time::Duration;

/// Check if status code indicates a transient failure worth retrying.
///
/// `503` is what the server reports when a commit lost every race, so the
/// whole request can safely be sent again.
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 425 | 429 | 502 | 503 | 504)
}

/// Exponential backoff delay calculation
///
/// The exponent is capped at 10.
pub fn exponential_backoff(attempt: u32, base_ms: u64) -> Duration {
    let delay_ms = base_ms.saturating_mul(2_u64.pow(attempt.min(10)));
    Duration::from_millis(delay_ms)
}
