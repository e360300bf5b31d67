//! Mapping results onto HTTP responses.

use crate::error::Error;
use crate::protocol::{format_etag, ErrorBody, DOCUMENT_VERSION};
use crate::types::Fingerprint;
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

impl Error {
    /// HTTP status code this error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::PreconditionFailed { .. } => StatusCode::PRECONDITION_FAILED,
            Error::Conflict { .. } | Error::State { .. } | Error::AlreadyExists(_) => StatusCode::CONFLICT,
            Error::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Http(_) | Error::Remote { .. } => StatusCode::BAD_GATEWAY,
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn to_body(&self) -> ErrorBody {
        let (current_version, current_content) = match self {
            Error::Conflict {
                current_version,
                current_content,
                ..
            } => (Some(*current_version), Some(current_content.clone())),
            Error::State { current, .. } => (Some(*current), None),
            Error::PreconditionFailed { current_version, .. } => (Some(*current_version), None),
            Error::Remote { current_version, .. } => (*current_version, None),
            _ => (None, None),
        };
        ErrorBody {
            error: self.kind().to_string(),
            message: self.to_string(),
            current_version,
            current_content,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else if matches!(self, Error::Conflict { .. }) {
            warn!(error = %self, "unresolvable conflict");
        }
        (status, Json(self.to_body())).into_response()
    }
}

/// A JSON body tagged with the document version and an `ETag` fingerprint.
#[derive(Debug)]
pub struct Versioned<T> {
    status: StatusCode,
    version: u64,
    fingerprint: Fingerprint,
    body: T,
}

impl<T: Serialize> Versioned<T> {
    /// `200 OK` response.
    pub fn ok(version: u64, fingerprint: Fingerprint, body: T) -> Self {
        Self {
            status: StatusCode::OK,
            version,
            fingerprint,
            body,
        }
    }

    /// Override the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Serialize> IntoResponse for Versioned<T> {
    fn into_response(self) -> Response {
        let headers = [
            (header::ETAG, format_etag(&self.fingerprint)),
            (HeaderName::from_static(DOCUMENT_VERSION), self.version.to_string()),
        ];
        (self.status, headers, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TransformError, ValidationError};
    use crate::types::DocumentId;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::from(ValidationError::Empty).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::NotFound(DocumentId::new()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(Error::State { expected: 5, current: 2 }.status_code(), StatusCode::CONFLICT);
        assert_eq!(Error::Storage("race".into()).status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_conflict_body_carries_current_state() {
        let err = Error::Conflict {
            reason: TransformError::OverlappingDelete { position: 2 },
            current_version: 4,
            current_content: "abc".into(),
        };
        let body = err.to_body();
        assert_eq!(body.error, "conflict");
        assert_eq!(body.current_version, Some(4));
        assert_eq!(body.current_content.as_deref(), Some("abc"));
    }

    #[test]
    fn test_versioned_headers() {
        let fingerprint = Fingerprint::of("hi", 2);
        let response = Versioned::ok(2, fingerprint.clone(), "hi").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ETAG], format_etag(&fingerprint).as_str());
        assert_eq!(response.headers()[DOCUMENT_VERSION], "2");
    }
}
