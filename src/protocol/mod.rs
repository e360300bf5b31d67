//! Wire protocol shared by [`server`](crate::server) and [`client`](crate::client).
//!
//! # Endpoints
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | `POST` | `/documents` | [`CreateDocumentRequest`] | `201` [`DocumentView`] |
//! | `GET` | `/documents/{id}` | | [`DocumentView`] |
//! | `POST` | `/documents/{id}/changes` | [`ChangeRequest`] | [`ApplyResponse`] |
//! | `POST` | `/documents/{id}/preview` | [`ChangeRequest`] | [`PreviewResponse`] |
//! | `GET` | `/documents/{id}/history` | [`HistoryQuery`] | [`HistoryPage`](crate::gate::HistoryPage) |
//!
//! # Status Codes
//!
//! - `400 Bad Request` - malformed or non-consuming operations, bad cursor
//! - `404 Not Found` - unknown document
//! - `409 Conflict` - stale beyond repair, or version from the future
//! - `503 Service Unavailable` - commit retries exhausted
//!
//! Every error carries an [`ErrorBody`].

pub mod headers;
pub mod messages;

pub use headers::{format_etag, parse_etag, ACTOR_ID, DOCUMENT_VERSION};
pub use messages::{
    ApplyResponse, ChangeRequest, CreateDocumentRequest, DocumentView, ErrorBody, HistoryQuery, PreviewResponse,
};
