//! Client configuration.

use serde::{Deserialize, Serialize};

/// Configuration for [`DocumentClient`](super::DocumentClient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Retries after a retryable failure.
    pub max_retries: u32,
    /// Base delay for exponential backoff, in milliseconds.
    pub retry_delay_ms: u64,
    /// Per-request timeout, in milliseconds.
    pub request_timeout_ms: u64,
    /// Idle connections kept per host.
    pub max_idle_per_host: usize,
    /// Sent as `X-Actor-Id` on every request when set.
    pub actor: Option<String>,
    /// Log retries.
    pub enable_logging: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_ms: 200,
            request_timeout_ms: 30_000,
            max_idle_per_host: 16,
            actor: None,
            enable_logging: true,
        }
    }
}
