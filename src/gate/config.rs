//! Change gate configuration.

use crate::client::exponential_backoff;
use crate::ot::{DeleteOverlap, Priority};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for [`ChangeGate`](super::ChangeGate).
///
/// # Examples
///
/// ```
/// use cowrite::gate::GateConfig;
/// use cowrite::ot::DeleteOverlap;
///
/// let config = GateConfig {
///     max_commit_retries: 5,
///     delete_overlap: DeleteOverlap::Reject,
///     ..Default::default()
/// };
/// assert_eq!(config.history_page_size, 50);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Attempts after a lost commit race before giving up with a storage error.
    pub max_commit_retries: u32,

    /// Base delay before the first commit retry, doubled on each further one.
    pub retry_backoff_ms: u64,

    /// Upper bound on a single commit retry delay.
    pub max_retry_backoff_ms: u64,

    /// Tie-break applied to incoming operations when rebasing them.
    pub incoming_priority: Priority,

    /// Whether an incoming delete may overlap one already in history.
    pub delete_overlap: DeleteOverlap,

    /// History page size when the caller gives none.
    pub history_page_size: usize,

    /// Upper bound on a requested history page size.
    pub max_history_page: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_commit_retries: 3,
            retry_backoff_ms: 2,
            max_retry_backoff_ms: 50,
            incoming_priority: Priority::Left,
            delete_overlap: DeleteOverlap::Shrink,
            history_page_size: 50,
            max_history_page: 500,
        }
    }
}

impl GateConfig {
    /// Delay before commit retry number `attempt` (zero-based).
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        exponential_backoff(attempt, self.retry_backoff_ms).min(Duration::from_millis(self.max_retry_backoff_ms))
    }

    /// Clamp a requested page size into `[1, max_history_page]`.
    pub fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.history_page_size)
            .clamp(1, self.max_history_page.max(1))
    }
}
