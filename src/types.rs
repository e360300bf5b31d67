//! Core document types shared by the gate, the store and the wire protocol.

use crate::ot::OperationSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        DocumentId(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for DocumentId {
    fn from(uuid: Uuid) -> Self {
        DocumentId(uuid)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(DocumentId)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of whoever authored a change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Sentinel for unauthenticated edits.
    pub const ANONYMOUS: &'static str = "anonymous";

    /// Create an actor id. Blank ids collapse to [`ActorId::anonymous`].
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.trim().is_empty() {
            Self::anonymous()
        } else {
            ActorId(id)
        }
    }

    /// The anonymous actor.
    pub fn anonymous() -> Self {
        ActorId(Self::ANONYMOUS.to_string())
    }

    /// Whether this is the anonymous sentinel.
    pub fn is_anonymous(&self) -> bool {
        self.0 == Self::ANONYMOUS
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current `(content, version)` pair of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentState {
    /// Document id.
    pub id: DocumentId,
    /// Plain-text content.
    pub content: String,
    /// Monotonic version, +1 per applied change.
    pub version: u64,
}

impl DocumentState {
    /// Fingerprint of this state.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(&self.content, self.version)
    }
}

/// An immutable entry of a document's change log.
///
/// # Invariants
///
/// - `to_version == from_version + 1`
/// - `operations.base_len()` equals the content length at `from_version`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Version the operations were applied to.
    pub from_version: u64,
    /// Version produced by applying them.
    pub to_version: u64,
    /// Operations as applied (already rebased).
    pub operations: OperationSet,
    /// Author of the change.
    pub actor: ActorId,
    /// Commit timestamp.
    pub applied_at: DateTime<Utc>,
}

impl ChangeRecord {
    /// Build the record for a change applied on top of `from_version`.
    pub fn new(
        from_version: u64,
        operations: OperationSet,
        actor: ActorId,
        applied_at: DateTime<Utc>,
    ) -> Self {
        ChangeRecord {
            from_version,
            to_version: from_version + 1,
            operations,
            actor,
            applied_at,
        }
    }
}

/// Deterministic hash of a document's `(content, version)`.
///
/// Used by callers as an optimistic-locking token (`ETag`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint `content` at `version`.
    pub fn of(content: &str, version: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(version.to_string().as_bytes());
        hasher.update(b":");
        hasher.update(content.as_bytes());
        Fingerprint(hex::encode(hasher.finalize()))
    }

    /// Hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
