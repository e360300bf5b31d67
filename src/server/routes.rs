//! Document endpoints.

use super::config::ServerConfig;
use super::identity::{HeaderIdentity, IdentityLayer};
use super::response::Versioned;
use crate::error::{Error, Result, ValidationError};
use crate::gate::{ChangeGate, Clock, HistoryCursor, HistoryPage, SystemClock};
use crate::protocol::{
    parse_etag, ApplyResponse, ChangeRequest, CreateDocumentRequest, DocumentView, HistoryQuery, PreviewResponse,
};
use crate::store::DocumentStore;
use crate::types::{ActorId, DocumentId};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

type SharedGate<S, C> = Arc<ChangeGate<S, C>>;

/// Router over an existing gate.
///
/// The identity layer runs before every handler; requests without a
/// resolvable actor are attributed to [`ActorId::anonymous`].
pub fn router<S, C>(gate: SharedGate<S, C>, identity: IdentityLayer) -> Router
where
    S: DocumentStore + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/documents", post(create_document::<S, C>))
        .route("/documents/{id}", get(get_document::<S, C>))
        .route("/documents/{id}/changes", post(apply_changes::<S, C>))
        .route("/documents/{id}/preview", post(preview_changes::<S, C>))
        .route("/documents/{id}/history", get(get_history::<S, C>))
        .layer(axum::middleware::from_fn(identity.middleware()))
        .layer(TraceLayer::new_for_http())
        .with_state(gate)
}

/// Router over `store` using the system clock and header identity from `config`.
pub fn app<S: DocumentStore + 'static>(store: S, config: &ServerConfig) -> Result<Router> {
    let header = HeaderName::from_bytes(config.actor_header.as_bytes())
        .map_err(|err| Error::Config(format!("actor header {:?}: {err}", config.actor_header)))?;
    let gate = ChangeGate::with_config(store, SystemClock, config.gate.clone());
    Ok(router(Arc::new(gate), IdentityLayer::new(HeaderIdentity::new(header))))
}

fn malformed(rejection: impl std::fmt::Display) -> Error {
    ValidationError::Malformed(rejection.to_string()).into()
}

fn parse_id(raw: &str) -> Result<DocumentId> {
    raw.parse()
        .map_err(|_| malformed(format!("invalid document id {raw:?}")))
}

async fn create_document<S: DocumentStore, C: Clock>(
    State(gate): State<SharedGate<S, C>>,
    Extension(actor): Extension<ActorId>,
    body: std::result::Result<Json<CreateDocumentRequest>, JsonRejection>,
) -> Result<Versioned<DocumentView>> {
    let Json(request) = body.map_err(malformed)?;
    let id = request.id.unwrap_or_default();
    let view = DocumentView::from(gate.create_document(id, &request.content, &actor).await?);
    Ok(Versioned::ok(view.version, view.content_fingerprint.clone(), view).with_status(StatusCode::CREATED))
}

async fn get_document<S: DocumentStore, C: Clock>(
    State(gate): State<SharedGate<S, C>>,
    Path(id): Path<String>,
) -> Result<Versioned<DocumentView>> {
    let view = DocumentView::from(gate.get_document(parse_id(&id)?).await?);
    Ok(Versioned::ok(view.version, view.content_fingerprint.clone(), view))
}

/// The fingerprint named by `If-Match`, if any. `*` matches any document.
fn if_match(headers: &HeaderMap) -> Result<Option<String>> {
    let Some(value) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(malformed)?.trim();
    if value == "*" {
        return Ok(None);
    }
    parse_etag(value)
        .map(|tag| Some(tag.to_string()))
        .ok_or_else(|| malformed(format!("invalid If-Match {value:?}")))
}

async fn apply_changes<S: DocumentStore, C: Clock>(
    State(gate): State<SharedGate<S, C>>,
    Path(id): Path<String>,
    Extension(actor): Extension<ActorId>,
    headers: HeaderMap,
    body: std::result::Result<Json<ChangeRequest>, JsonRejection>,
) -> Result<Versioned<ApplyResponse>> {
    let id = parse_id(&id)?;
    let precondition = if_match(&headers)?;
    let Json(request) = body.map_err(malformed)?;
    debug!(
        document = %id,
        actor = %actor,
        expected_version = request.expected_version,
        operations = request.operations.len(),
        "apply request"
    );
    let applied = match precondition {
        Some(tag) => {
            gate.apply_changes_if_match(id, request.expected_version, &tag, request.operations, &actor)
                .await?
        }
        None => {
            gate.apply_changes(id, request.expected_version, request.operations, &actor)
                .await?
        }
    };
    Ok(Versioned::ok(
        applied.new_version,
        applied.content_fingerprint.clone(),
        ApplyResponse::from(applied),
    ))
}

async fn preview_changes<S: DocumentStore, C: Clock>(
    State(gate): State<SharedGate<S, C>>,
    Path(id): Path<String>,
    body: std::result::Result<Json<ChangeRequest>, JsonRejection>,
) -> Result<Json<PreviewResponse>> {
    let id = parse_id(&id)?;
    let Json(request) = body.map_err(malformed)?;
    let preview = gate
        .preview_changes(id, request.expected_version, request.operations)
        .await?;
    Ok(Json(preview))
}

async fn get_history<S: DocumentStore, C: Clock>(
    State(gate): State<SharedGate<S, C>>,
    Path(id): Path<String>,
    query: std::result::Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryPage>> {
    let id = parse_id(&id)?;
    let Query(query) = query.map_err(malformed)?;
    let cursor = query.cursor.as_deref().map(HistoryCursor::decode).transpose()?;
    Ok(Json(gate.get_history(id, cursor, query.limit).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ErrorBody, ACTOR_ID};
    use crate::store::InMemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        app(InMemoryStore::new(), &ServerConfig::default()).unwrap()
    }

    fn post_json(uri: &str, actor: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(actor) = actor {
            builder = builder.header(ACTOR_ID, actor);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn read<T: DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create(app: &Router, content: &str) -> DocumentView {
        let response = app
            .clone()
            .oneshot(post_json("/documents", Some("owner"), json!({ "content": content })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        read(response).await
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let app = test_app();
        let created = create(&app, "Hello").await;
        assert_eq!(created.version, 1);

        let response = app.clone().oneshot(get(&format!("/documents/{}", created.id))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let etag = response.headers()[header::ETAG].to_str().unwrap().to_string();
        assert_eq!(etag, format!("\"{}\"", created.content_fingerprint));
        let view: DocumentView = read(response).await;
        assert_eq!(view, created);
    }

    #[tokio::test]
    async fn test_stale_change_is_rebased() {
        let app = test_app();
        let doc = create(&app, "ABC").await;
        let uri = format!("/documents/{}/changes", doc.id);

        let first = json!({"expected_version": 1, "operations": [
            {"kind": "retain", "length": 1},
            {"kind": "insert", "text": "Z"},
            {"kind": "retain", "length": 2}
        ]});
        let response = app.clone().oneshot(post_json(&uri, Some("bob"), first)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stale = json!({"expected_version": 1, "operations": [
            {"kind": "retain", "length": 1},
            {"kind": "delete", "length": 1},
            {"kind": "retain", "length": 1}
        ]});
        let response = app.clone().oneshot(post_json(&uri, Some("alice"), stale)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-document-version"], "3");
        let applied: ApplyResponse = read(response).await;
        assert_eq!(applied.content, "AZC");
        assert_eq!(applied.new_version, 3);

        let response = app
            .clone()
            .oneshot(get(&format!("/documents/{}/history?limit=1", doc.id)))
            .await
            .unwrap();
        let page: Value = read(response).await;
        assert_eq!(page["records"][0]["actor"], "alice");
        assert_eq!(page["records"][0]["to_version"], 3);
        assert!(page["next_cursor"].is_string());
    }

    #[tokio::test]
    async fn test_future_version_is_409() {
        let app = test_app();
        let doc = create(&app, "ABC").await;
        let request = post_json(
            &format!("/documents/{}/changes", doc.id),
            None,
            json!({"expected_version": 5, "operations": [{"kind": "retain", "length": 3}]}),
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body: ErrorBody = read(response).await;
        assert_eq!(body.error, "state");
        assert_eq!(body.current_version, Some(1));
    }

    #[tokio::test]
    async fn test_validation_errors_are_400() {
        let app = test_app();
        let doc = create(&app, "ABC").await;
        let uri = format!("/documents/{}/changes", doc.id);

        let empty = json!({"expected_version": 1, "operations": []});
        let response = app.clone().oneshot(post_json(&uri, None, empty)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let short = json!({"expected_version": 1, "operations": [{"kind": "retain", "length": 2}]});
        let response = app.clone().oneshot(post_json(&uri, None, short)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = read(response).await;
        assert_eq!(body.error, "validation");

        let unknown_kind = json!({"expected_version": 1, "operations": [{"kind": "move", "length": 2}]});
        let response = app.clone().oneshot(post_json(&uri, None, unknown_kind)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_huge_lengths_are_400() {
        let app = test_app();
        let doc = create(&app, "abc").await;
        let uri = format!("/documents/{}/changes", doc.id);

        let body = json!({"expected_version": 1, "operations": [
            {"kind": "retain", "length": 2},
            {"kind": "delete", "length": u64::MAX},
            {"kind": "retain", "length": 2}
        ]});
        let response = app.clone().oneshot(post_json(&uri, None, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorBody = read(response).await;
        assert_eq!(error.error, "validation");

        let merged = json!({"expected_version": 1, "operations": [
            {"kind": "retain", "length": 1},
            {"kind": "retain", "length": u64::MAX}
        ]});
        let response = app
            .clone()
            .oneshot(post_json(&format!("/documents/{}/preview", doc.id), None, merged))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let view: DocumentView = read(app.clone().oneshot(get(&format!("/documents/{}", doc.id))).await.unwrap()).await;
        assert_eq!(view.version, 1);
        assert_eq!(view.content, "abc");
    }

    #[tokio::test]
    async fn test_if_match_guards_changes() {
        let app = test_app();
        let doc = create(&app, "ABC").await;
        let uri = format!("/documents/{}/changes", doc.id);
        let body = json!({"expected_version": 1, "operations": [
            {"kind": "retain", "length": 3},
            {"kind": "insert", "text": "D"}
        ]});
        let guarded = |tag: &str, body: Value| {
            let mut request = post_json(&uri, None, body);
            request.headers_mut().insert(header::IF_MATCH, tag.parse().unwrap());
            request
        };

        let etag = format!("\"{}\"", doc.content_fingerprint);
        let response = app.clone().oneshot(guarded(&etag, body.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Same tag again: the document has moved on to version 2.
        let response = app.clone().oneshot(guarded(&etag, body.clone())).await.unwrap();
        assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
        let error: ErrorBody = read(response).await;
        assert_eq!(error.error, "precondition_failed");
        assert_eq!(error.current_version, Some(2));

        let response = app.clone().oneshot(guarded("*", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_and_invalid_ids() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(get(&format!("/documents/{}", DocumentId::new())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app.clone().oneshot(get("/documents/not-a-uuid")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_preview_does_not_commit() {
        let app = test_app();
        let doc = create(&app, "Hello").await;
        let body = json!({"expected_version": 1, "operations": [
            {"kind": "retain", "length": 5},
            {"kind": "insert", "text": "!"}
        ]});
        let response = app
            .clone()
            .oneshot(post_json(&format!("/documents/{}/preview", doc.id), None, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let preview: PreviewResponse = read(response).await;
        assert_eq!(preview.resulting_content, "Hello!");
        assert_eq!(preview.would_be_version, 2);

        let response = app.clone().oneshot(get(&format!("/documents/{}", doc.id))).await.unwrap();
        let view: DocumentView = read(response).await;
        assert_eq!(view.version, 1);
        assert_eq!(view.content, "Hello");
    }

    #[tokio::test]
    async fn test_bad_history_cursor() {
        let app = test_app();
        let doc = create(&app, "x").await;
        let response = app
            .clone()
            .oneshot(get(&format!("/documents/{}/history?cursor=bogus", doc.id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_create_is_409() {
        let app = test_app();
        let doc = create(&app, "x").await;
        let response = app
            .clone()
            .oneshot(post_json("/documents", None, json!({"id": doc.id, "content": "y"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_actor_header_config() {
        let config = ServerConfig {
            actor_header: "bad header".into(),
            ..Default::default()
        };
        assert!(matches!(app(InMemoryStore::new(), &config), Err(Error::Config(_))));
    }
}
