//! Optimistic-concurrency apply and preview over a [`DocumentStore`].

use super::clock::Clock;
use super::config::GateConfig;
use super::history::{HistoryCursor, HistoryPage};
use crate::error::{Error, Result, ValidationError};
use crate::ot::{rebase, Operation, OperationSet};
use crate::store::DocumentStore;
use crate::types::{ActorId, ChangeRecord, DocumentId, DocumentState, Fingerprint};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Outcome of a committed change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedChange {
    /// Version produced by the commit.
    pub new_version: u64,
    /// Content at `new_version`.
    pub content: String,
    /// Fingerprint of `(content, new_version)`.
    pub content_fingerprint: Fingerprint,
    /// Operations as recorded, i.e. after rebasing.
    pub operations: OperationSet,
}

/// What an apply would produce, without committing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    /// Content the apply would leave behind.
    pub resulting_content: String,
    /// Version the apply would produce.
    pub would_be_version: u64,
    /// Operations after rebasing onto the current version.
    pub operations: OperationSet,
}

/// Reads, rebases and applies incoming operations, then commits them with a
/// compare-and-swap on the document version.
///
/// The gate holds no per-document state of its own; every call reads the
/// current document from the store. A commit that loses its race is retried
/// from a fresh read up to [`GateConfig::max_commit_retries`] times.
///
/// # Examples
///
/// ```ignore
/// use cowrite::gate::{ChangeGate, SystemClock};
/// use cowrite::store::InMemoryStore;
/// use cowrite::ot::Operation;
/// use cowrite::{ActorId, DocumentId};
///
/// let gate = ChangeGate::new(InMemoryStore::new(), SystemClock);
/// let alice = ActorId::new("alice");
/// let id = DocumentId::new();
/// gate.create_document(id, "Hello", &alice).await?;
///
/// let applied = gate
///     .apply_changes(id, 1, vec![Operation::retain(5), Operation::insert("!")], &alice)
///     .await?;
/// assert_eq!(applied.content, "Hello!");
/// ```
pub struct ChangeGate<S, C> {
    store: S,
    clock: C,
    config: GateConfig,
}

/// Rebased operations and the content they produce on top of `current`.
struct Plan {
    current: DocumentState,
    rebased: OperationSet,
    content: String,
}

impl<S: DocumentStore, C: Clock> ChangeGate<S, C> {
    /// Create a gate with the default configuration.
    pub fn new(store: S, clock: C) -> Self {
        Self::with_config(store, clock, GateConfig::default())
    }

    /// Create a gate with a custom configuration.
    pub fn with_config(store: S, clock: C, config: GateConfig) -> Self {
        Self { store, clock, config }
    }

    /// The underlying store.
    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The gate configuration.
    #[inline]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Create a document at version 1.
    ///
    /// The creation itself is logged as the record `0 -> 1` inserting the
    /// initial content into the empty document.
    pub async fn create_document(&self, id: DocumentId, content: &str, actor: &ActorId) -> Result<DocumentState> {
        let mut operations = OperationSet::new();
        operations.insert(content);
        let record = ChangeRecord::new(0, operations, actor.clone(), self.clock.now());
        let initial = DocumentState {
            id,
            content: content.to_string(),
            version: record.to_version,
        };
        let state = self.store.create(initial, record).await?;
        info!(document = %id, actor = %actor, "document created");
        Ok(state)
    }

    /// Current state of a document.
    pub async fn get_document(&self, id: DocumentId) -> Result<DocumentState> {
        Ok(self.store.get_current(id).await?)
    }

    /// Apply `operations`, authored against `expected_version`, to the
    /// current version of the document.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] for empty or non-consuming operations
    /// - [`Error::State`] when `expected_version` is ahead of the document
    /// - [`Error::Conflict`] when the operations cannot be rebased
    /// - [`Error::Storage`] when every commit attempt lost its race
    pub async fn apply_changes(
        &self,
        id: DocumentId,
        expected_version: u64,
        operations: Vec<Operation>,
        actor: &ActorId,
    ) -> Result<AppliedChange> {
        self.apply_guarded(id, expected_version, None, operations, actor).await
    }

    /// [`apply_changes`](Self::apply_changes), committed only while the
    /// document's fingerprint still equals `if_match`.
    ///
    /// The fingerprint is re-checked on every commit attempt, so a change that
    /// loses its race to another writer fails with
    /// [`Error::PreconditionFailed`] instead of being rebased.
    pub async fn apply_changes_if_match(
        &self,
        id: DocumentId,
        expected_version: u64,
        if_match: &str,
        operations: Vec<Operation>,
        actor: &ActorId,
    ) -> Result<AppliedChange> {
        self.apply_guarded(id, expected_version, Some(if_match), operations, actor)
            .await
    }

    async fn apply_guarded(
        &self,
        id: DocumentId,
        expected_version: u64,
        if_match: Option<&str>,
        operations: Vec<Operation>,
        actor: &ActorId,
    ) -> Result<AppliedChange> {
        let incoming = prepare(operations)?;
        let mut attempt = 0u32;

        loop {
            match self.try_commit(id, expected_version, if_match, &incoming, actor).await {
                Ok(applied) => return Ok(applied),
                Err(err) if err.is_retryable() && attempt < self.config.max_commit_retries => {
                    let delay = self.config.retry_delay(attempt);
                    attempt += 1;
                    warn!(
                        document = %id,
                        attempt,
                        ?delay,
                        error = %err,
                        "commit failed, retrying from a fresh read"
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    if err.is_retryable() {
                        warn!(document = %id, attempts = attempt + 1, "giving up on commit");
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Compute what [`apply_changes`](Self::apply_changes) would produce,
    /// without writing anything.
    pub async fn preview_changes(
        &self,
        id: DocumentId,
        expected_version: u64,
        operations: Vec<Operation>,
    ) -> Result<Preview> {
        let incoming = prepare(operations)?;
        let plan = self.plan(id, expected_version, None, &incoming).await?;
        Ok(Preview {
            resulting_content: plan.content,
            would_be_version: plan.current.version + 1,
            operations: plan.rebased,
        })
    }

    /// A page of the change log, newest first.
    ///
    /// `limit` is clamped by [`GateConfig::page_size`].
    pub async fn get_history(
        &self,
        id: DocumentId,
        cursor: Option<HistoryCursor>,
        limit: Option<usize>,
    ) -> Result<HistoryPage> {
        let limit = self.config.page_size(limit);
        let before = cursor.map(|cursor| cursor.to_version_bound());
        let records = self.store.records_before(id, before, limit + 1).await?;
        Ok(HistoryPage::from_overfetch(records, limit))
    }

    async fn try_commit(
        &self,
        id: DocumentId,
        expected_version: u64,
        if_match: Option<&str>,
        incoming: &OperationSet,
        actor: &ActorId,
    ) -> Result<AppliedChange> {
        let plan = self.plan(id, expected_version, if_match, incoming).await?;
        let base_version = plan.current.version;
        let record = ChangeRecord::new(base_version, plan.rebased.clone(), actor.clone(), self.clock.now());

        let state = self.store.commit(id, base_version, plan.content, record).await?;
        info!(
            document = %id,
            actor = %actor,
            expected_version,
            version = state.version,
            "change applied"
        );

        Ok(AppliedChange {
            new_version: state.version,
            content_fingerprint: state.fingerprint(),
            content: state.content,
            operations: plan.rebased,
        })
    }

    async fn plan(
        &self,
        id: DocumentId,
        expected_version: u64,
        if_match: Option<&str>,
        incoming: &OperationSet,
    ) -> Result<Plan> {
        let current = self.store.get_current(id).await?;

        if let Some(tag) = if_match {
            let current_fingerprint = current.fingerprint();
            if current_fingerprint.as_str() != tag {
                return Err(Error::PreconditionFailed {
                    current_version: current.version,
                    current_fingerprint,
                });
            }
        }

        if expected_version > current.version {
            return Err(Error::State {
                expected: expected_version,
                current: current.version,
            });
        }

        let rebased = if expected_version == current.version {
            incoming.clone()
        } else {
            let history = self.intervening(id, expected_version, current.version).await?;
            // The first intervening change was built on the client's base.
            if let Some(first) = history.first() {
                let base_len = first.operations.base_len();
                if incoming.base_len() != base_len {
                    return Err(ValidationError::LengthMismatch {
                        consumed: incoming.base_len(),
                        expected: base_len,
                    }
                    .into());
                }
            }
            debug!(
                document = %id,
                expected_version,
                current_version = current.version,
                intervening = history.len(),
                "rebasing stale change"
            );
            rebase(
                incoming,
                history.iter().map(|record| &record.operations),
                self.config.incoming_priority,
                self.config.delete_overlap,
            )
            .map_err(|reason| Error::Conflict {
                reason,
                current_version: current.version,
                current_content: current.content.clone(),
            })?
        };

        let content = rebased.apply(&current.content)?;
        Ok(Plan {
            current,
            rebased,
            content,
        })
    }

    /// Records with `from_version` in `[from, to)`, checked for gaps.
    async fn intervening(&self, id: DocumentId, from: u64, to: u64) -> Result<Vec<ChangeRecord>> {
        let records: Vec<ChangeRecord> = self
            .store
            .records_since(id, from)
            .await?
            .into_iter()
            .take_while(|record| record.from_version < to)
            .collect();

        let contiguous = records.len() as u64 == to - from
            && records
                .iter()
                .zip(from..)
                .all(|(record, version)| record.from_version == version && record.to_version == version + 1);
        if !contiguous {
            return Err(Error::Storage(format!(
                "change log for {id} is not contiguous between versions {from} and {to}"
            )));
        }
        Ok(records)
    }
}

/// Canonicalize incoming wire operations, rejecting an empty submission.
fn prepare(operations: Vec<Operation>) -> Result<OperationSet> {
    if operations.is_empty() {
        return Err(ValidationError::Empty.into());
    }
    Ok(OperationSet::from_operations(operations))
}
