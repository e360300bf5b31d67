//! The storage collaborator the change gate commits through.
//!
//! A store owns every document's `(content, version)` pair and its
//! append-only change log. The only write path is [`DocumentStore::commit`],
//! a compare-and-swap on the version that must update content, version and
//! log as one unit.
//!
//! [`InMemoryStore`] is the reference implementation used by the server
//! demo and the tests.

mod memory;

pub use memory::InMemoryStore;

use crate::error::StoreError;
use crate::types::{ChangeRecord, DocumentId, DocumentState};
use async_trait::async_trait;

/// Persistence boundary for documents and their change logs.
///
/// Implementations must be safe to share between concurrently running
/// request handlers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document at the version carried by `initial`.
    ///
    /// Fails with [`StoreError::AlreadyExists`] when the id is taken.
    async fn create(&self, initial: DocumentState, record: ChangeRecord) -> Result<DocumentState, StoreError>;

    /// Read the current `(content, version)` pair.
    async fn get_current(&self, id: DocumentId) -> Result<DocumentState, StoreError>;

    /// Records with `from_version >= from_version`, oldest first.
    async fn records_since(&self, id: DocumentId, from_version: u64) -> Result<Vec<ChangeRecord>, StoreError>;

    /// Up to `limit` records with `to_version < before` (all when `None`),
    /// newest first.
    async fn records_before(
        &self,
        id: DocumentId,
        before: Option<u64>,
        limit: usize,
    ) -> Result<Vec<ChangeRecord>, StoreError>;

    /// Atomically replace the content and append `record`, provided the
    /// stored version still equals `expected_version`.
    ///
    /// Fails with [`StoreError::VersionRace`] when another commit got there
    /// first; nothing is written in that case.
    async fn commit(
        &self,
        id: DocumentId,
        expected_version: u64,
        new_content: String,
        record: ChangeRecord,
    ) -> Result<DocumentState, StoreError>;
}
