//! HTTP client for a cowrite server.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── fetch  - DocumentClient and endpoint calls
//! ├── config - client configuration
//! └── utils  - retry helpers
//! ```
//!
//! # Examples
//!
//! ```
//! use cowrite::client::{ClientConfig, DocumentClient};
//!
//! let config = ClientConfig {
//!     max_retries: 5,
//!     actor: Some("alice".into()),
//!     ..Default::default()
//! };
//! let client = DocumentClient::with_config("http://localhost:3000", config).unwrap();
//! assert_eq!(client.config().max_retries, 5);
//! ```
//!
//! ```
//! use cowrite::client::{exponential_backoff, is_retryable_status};
//! use std::time::Duration;
//!
//! assert!(is_retryable_status(503));
//! assert!(!is_retryable_status(409));
//! assert_eq!(exponential_backoff(2, 100), Duration::from_millis(400));
//! ```

mod config;
mod fetch;
mod utils;

pub use config::ClientConfig;
pub use fetch::DocumentClient;
pub use utils::{exponential_backoff, is_retryable_status};
