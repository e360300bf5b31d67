//! Error types for the OT engine, the change gate and the HTTP surface.
//!
//! Errors fall into four families that callers treat differently:
//!
//! | Family | Variant | Retried? |
//! |--------|---------|----------|
//! | Validation | [`Error::Validation`] | never |
//! | Conflict | [`Error::Conflict`] | never, returned with current state |
//! | State | [`Error::State`] | never |
//! | Storage | [`Error::Storage`] | internally, up to the configured budget |
//!
//! The remaining variants belong to the HTTP surface (`Http`, `Remote`, `Json`)
//! or to document lookup (`NotFound`, `AlreadyExists`).

use crate::types::{DocumentId, Fingerprint};
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// A malformed or non-consuming operation set.
///
/// Always raised before any content is produced or stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No operations were submitted.
    #[error("at least one operation is required")]
    Empty,

    /// The retain and delete lengths do not add up to the source length.
    #[error("operations consume {consumed} characters but the source has {expected}")]
    LengthMismatch {
        /// Sum of retain and delete lengths.
        consumed: usize,
        /// Length of the source text.
        expected: usize,
    },

    /// A single retain or delete reaches past the end of the source.
    #[error("operation {index} reads up to {end} but the source has {len} characters")]
    OutOfBounds {
        /// Position of the offending operation in its set.
        index: usize,
        /// Cursor position the operation would end at.
        end: usize,
        /// Length of the source text.
        len: usize,
    },

    /// A history cursor that was not produced by this service.
    #[error("invalid history cursor: {0}")]
    InvalidCursor(String),

    /// A request body, path or query string that could not be decoded.
    #[error("malformed request: {0}")]
    Malformed(String),
}

/// The transformer could not reconcile two operation sets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The two sets were built against documents of different lengths.
    #[error("operation sets disagree on base length ({left} vs {right})")]
    BaseLengthMismatch {
        /// Base length of the set being rewritten.
        left: usize,
        /// Base length of the already-applied set.
        right: usize,
    },

    /// Both sides delete the same region and the policy forbids shrinking.
    #[error("both sides delete the region starting at base position {position}")]
    OverlappingDelete {
        /// Position in the shared base document where the overlap starts.
        position: usize,
    },
}

/// Failure reported by a [`DocumentStore`](crate::store::DocumentStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No document with this id.
    #[error("document {0} not found")]
    NotFound(DocumentId),

    /// A document with this id already exists.
    #[error("document {0} already exists")]
    AlreadyExists(DocumentId),

    /// Another commit advanced the version between read and commit.
    #[error("version race: expected {expected}, found {actual}")]
    VersionRace {
        /// Version the commit was conditioned on.
        expected: u64,
        /// Version actually stored.
        actual: u64,
    },

    /// The backend itself failed.
    #[error("storage backend failure: {0}")]
    Backend(String),
}

/// Top-level error returned by the gate, the server and the client.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or non-consuming operations.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Operations could not be rebased over the intervening history.
    #[error("conflict against version {current_version}: {reason}")]
    Conflict {
        /// What the transformer rejected.
        reason: TransformError,
        /// Version the caller has to rebase onto manually.
        current_version: u64,
        /// Content at `current_version`.
        current_content: String,
    },

    /// The client claims a version the server never produced.
    #[error("expected version {expected} is ahead of current version {current}")]
    State {
        /// Version claimed by the client.
        expected: u64,
        /// Version actually stored.
        current: u64,
    },

    /// An `If-Match` fingerprint no longer names the current content.
    #[error("precondition failed: document is at version {current_version} ({current_fingerprint})")]
    PreconditionFailed {
        /// Version actually stored.
        current_version: u64,
        /// Fingerprint of the stored content.
        current_fingerprint: Fingerprint,
    },

    /// Unknown document.
    #[error("document {0} not found")]
    NotFound(DocumentId),

    /// Document id already taken.
    #[error("document {0} already exists")]
    AlreadyExists(DocumentId),

    /// Commit lost its race (after retries) or the storage boundary failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Error response decoded from a remote server.
    #[error("remote error {status} ({kind}): {message}")]
    Remote {
        /// HTTP status code.
        status: u16,
        /// Error kind as reported by the server.
        kind: String,
        /// Human-readable message.
        message: String,
        /// Current version, when the server reported one.
        current_version: Option<u64>,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the operation that produced this error may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Storage(_) | Error::Http(_) => true,
            Error::Remote { status, .. } => crate::client::is_retryable_status(*status),
            _ => false,
        }
    }

    /// Stable machine-readable name, used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::Conflict { .. } => "conflict",
            Error::State { .. } => "state",
            Error::PreconditionFailed { .. } => "precondition_failed",
            Error::NotFound(_) => "not_found",
            Error::AlreadyExists(_) => "already_exists",
            Error::Storage(_) => "storage",
            Error::Http(_) => "http",
            Error::Remote { .. } => "remote",
            Error::Json(_) => "json",
            Error::Config(_) => "config",
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Error::NotFound(id),
            StoreError::AlreadyExists(id) => Error::AlreadyExists(id),
            other => Error::Storage(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http(err.to_string())
    }
}
