//! JSON bodies exchanged between the server and the client.

use crate::gate::{AppliedChange, HistoryCursor, Preview};
use crate::ot::Operation;
use crate::types::{DocumentId, DocumentState, Fingerprint};
use serde::{Deserialize, Serialize};

/// `POST /documents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    /// Caller-chosen id; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    /// Initial plain-text content.
    #[serde(default)]
    pub content: String,
}

/// A document as returned by create and get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentView {
    /// Document id.
    pub id: DocumentId,
    /// Current content.
    pub content: String,
    /// Current version.
    pub version: u64,
    /// Fingerprint of `(content, version)`.
    pub content_fingerprint: Fingerprint,
}

impl From<DocumentState> for DocumentView {
    fn from(state: DocumentState) -> Self {
        DocumentView {
            content_fingerprint: state.fingerprint(),
            id: state.id,
            content: state.content,
            version: state.version,
        }
    }
}

/// `POST /documents/{id}/changes` and `POST /documents/{id}/preview`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Version the operations were built against.
    pub expected_version: u64,
    /// Operations in wire form.
    pub operations: Vec<Operation>,
}

/// Successful apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyResponse {
    /// Version after the commit.
    pub new_version: u64,
    /// Content after the commit.
    pub content: String,
    /// Fingerprint of `(content, new_version)`.
    pub content_fingerprint: Fingerprint,
}

impl From<AppliedChange> for ApplyResponse {
    fn from(applied: AppliedChange) -> Self {
        ApplyResponse {
            new_version: applied.new_version,
            content: applied.content,
            content_fingerprint: applied.content_fingerprint,
        }
    }
}

/// Successful preview.
pub type PreviewResponse = Preview;

/// Query string of `GET /documents/{id}/history`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Cursor from a previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    /// Requested page size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl HistoryQuery {
    /// Query for the page after `cursor`.
    pub fn after(cursor: &HistoryCursor) -> Self {
        HistoryQuery {
            cursor: Some(cursor.encode()),
            limit: None,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind (see [`Error::kind`](crate::Error::kind)).
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Current version, for conflict and state errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<u64>,
    /// Current content, for conflict errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_content: Option<String>,
}
