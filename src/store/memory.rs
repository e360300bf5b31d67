//! In-memory document store with per-document locking.
//!
//! Each document lives behind its own `RwLock`, so commits to different
//! documents never contend and readers of one document do not block each
//! other. The registry lock is only held long enough to look an entry up.

use super::DocumentStore;
use crate::error::StoreError;
use crate::types::{ChangeRecord, DocumentId, DocumentState};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A single document with its full change log.
///
/// # Invariants
///
/// - `log` is ordered by `to_version` with no gaps
/// - the last record's `to_version` equals `state.version`
#[derive(Debug, Clone)]
struct DocumentEntry {
    state: DocumentState,
    log: Vec<ChangeRecord>,
}

/// Thread-safe, process-local [`DocumentStore`].
///
/// Cloning yields a new handle to the same documents.
///
/// # Examples
///
/// ```ignore
/// use cowrite::store::InMemoryStore;
///
/// let store = InMemoryStore::new();
/// assert!(store.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    documents: Arc<RwLock<HashMap<DocumentId, Arc<RwLock<DocumentEntry>>>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of every stored document, in arbitrary order.
    pub fn list_documents(&self) -> Vec<DocumentId> {
        self.documents.read().keys().copied().collect()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    /// Whether no documents are stored.
    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    fn entry(&self, id: DocumentId) -> Result<Arc<RwLock<DocumentEntry>>, StoreError> {
        self.documents
            .read()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create(&self, initial: DocumentState, record: ChangeRecord) -> Result<DocumentState, StoreError> {
        let mut documents = self.documents.write();
        if documents.contains_key(&initial.id) {
            return Err(StoreError::AlreadyExists(initial.id));
        }
        debug!(document = %initial.id, version = initial.version, "created document");
        documents.insert(
            initial.id,
            Arc::new(RwLock::new(DocumentEntry {
                state: initial.clone(),
                log: vec![record],
            })),
        );
        Ok(initial)
    }

    async fn get_current(&self, id: DocumentId) -> Result<DocumentState, StoreError> {
        let entry = self.entry(id)?;
        let state = entry.read().state.clone();
        Ok(state)
    }

    async fn records_since(&self, id: DocumentId, from_version: u64) -> Result<Vec<ChangeRecord>, StoreError> {
        let entry = self.entry(id)?;
        let guard = entry.read();
        Ok(guard
            .log
            .iter()
            .filter(|record| record.from_version >= from_version)
            .cloned()
            .collect())
    }

    async fn records_before(
        &self,
        id: DocumentId,
        before: Option<u64>,
        limit: usize,
    ) -> Result<Vec<ChangeRecord>, StoreError> {
        let entry = self.entry(id)?;
        let guard = entry.read();
        Ok(guard
            .log
            .iter()
            .rev()
            .filter(|record| before.map_or(true, |bound| record.to_version < bound))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn commit(
        &self,
        id: DocumentId,
        expected_version: u64,
        new_content: String,
        record: ChangeRecord,
    ) -> Result<DocumentState, StoreError> {
        let entry = self.entry(id)?;
        let mut guard = entry.write();

        if guard.state.version != expected_version {
            warn!(
                document = %id,
                expected = expected_version,
                actual = guard.state.version,
                "commit lost version race"
            );
            return Err(StoreError::VersionRace {
                expected: expected_version,
                actual: guard.state.version,
            });
        }
        if record.from_version != expected_version || record.to_version != expected_version + 1 {
            return Err(StoreError::Backend(format!(
                "record {}->{} does not follow version {}",
                record.from_version, record.to_version, expected_version
            )));
        }

        guard.state.content = new_content;
        guard.state.version = record.to_version;
        guard.log.push(record);
        debug!(document = %id, version = guard.state.version, "committed change");
        Ok(guard.state.clone())
    }
}
