//! HTTP client for the document endpoints.

use crate::client::config::ClientConfig;
use crate::client::utils::exponential_backoff;
use crate::error::{Error, Result};
use crate::gate::{HistoryCursor, HistoryPage};
use crate::ot::{diff, normalize_line_endings, Operation};
use crate::protocol::{
    format_etag, ApplyResponse, ChangeRequest, CreateDocumentRequest, DocumentView, ErrorBody, PreviewResponse,
    ACTOR_ID,
};
use crate::types::{DocumentId, Fingerprint};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use url::Url;

/// Client for a cowrite server.
///
/// Requests that fail with a transport error or a retryable status are
/// retried with exponential backoff, up to [`ClientConfig::max_retries`].
///
/// # Examples
///
/// ```ignore
/// use cowrite::client::DocumentClient;
///
/// let client = DocumentClient::new("http://localhost:3000")?;
/// let doc = client.create("Hello").await?;
/// let applied = client.submit_edit(doc.id, doc.version, "Hello", "Hello!").await?;
/// ```
#[derive(Clone)]
pub struct DocumentClient {
    http: reqwest::Client,
    base: Url,
    config: Arc<ClientConfig>,
}

impl DocumentClient {
    /// Client for `base_url` with the default configuration.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, ClientConfig::default())
    }

    /// Client for `base_url` with a custom configuration.
    pub fn with_config(base_url: &str, config: ClientConfig) -> Result<Self> {
        let base = Url::parse(base_url).map_err(|err| Error::Config(format!("base URL {base_url:?}: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!("base URL {base_url:?} cannot hold a path")));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()?;

        Ok(DocumentClient {
            http,
            base,
            config: Arc::new(config),
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a document with a server-assigned id.
    pub async fn create(&self, content: &str) -> Result<DocumentView> {
        self.create_request(CreateDocumentRequest {
            id: None,
            content: content.to_string(),
        })
        .await
    }

    /// Create a document with a chosen id.
    pub async fn create_with_id(&self, id: DocumentId, content: &str) -> Result<DocumentView> {
        self.create_request(CreateDocumentRequest {
            id: Some(id),
            content: content.to_string(),
        })
        .await
    }

    async fn create_request(&self, request: CreateDocumentRequest) -> Result<DocumentView> {
        let url = self.endpoint(&["documents"])?;
        self.send(Method::POST, url, Some(&request), None).await
    }

    /// Current state of a document.
    pub async fn get(&self, id: DocumentId) -> Result<DocumentView> {
        let url = self.endpoint(&["documents", &id.to_string()])?;
        self.send::<(), _>(Method::GET, url, None, None).await
    }

    /// Submit operations authored against `expected_version`.
    pub async fn apply_changes(
        &self,
        id: DocumentId,
        expected_version: u64,
        operations: Vec<Operation>,
    ) -> Result<ApplyResponse> {
        let url = self.endpoint(&["documents", &id.to_string(), "changes"])?;
        let request = ChangeRequest {
            expected_version,
            operations,
        };
        self.send(Method::POST, url, Some(&request), None).await
    }

    /// Submit operations only while the document still has `fingerprint`.
    ///
    /// Fails with a `412` [`Error::Remote`] once anyone else has committed.
    pub async fn apply_changes_if_match(
        &self,
        id: DocumentId,
        expected_version: u64,
        fingerprint: &Fingerprint,
        operations: Vec<Operation>,
    ) -> Result<ApplyResponse> {
        let url = self.endpoint(&["documents", &id.to_string(), "changes"])?;
        let request = ChangeRequest {
            expected_version,
            operations,
        };
        self.send(Method::POST, url, Some(&request), Some(fingerprint)).await
    }

    /// Ask what [`apply_changes`](Self::apply_changes) would produce.
    pub async fn preview_changes(
        &self,
        id: DocumentId,
        expected_version: u64,
        operations: Vec<Operation>,
    ) -> Result<PreviewResponse> {
        let url = self.endpoint(&["documents", &id.to_string(), "preview"])?;
        let request = ChangeRequest {
            expected_version,
            operations,
        };
        self.send(Method::POST, url, Some(&request), None).await
    }

    /// One page of the change log, newest first.
    pub async fn history(
        &self,
        id: DocumentId,
        cursor: Option<&HistoryCursor>,
        limit: Option<usize>,
    ) -> Result<HistoryPage> {
        let mut url = self.endpoint(&["documents", &id.to_string(), "history"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(cursor) = cursor {
                query.append_pair("cursor", &cursor.encode());
            }
            if let Some(limit) = limit {
                query.append_pair("limit", &limit.to_string());
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.send::<(), _>(Method::GET, url, None, None).await
    }

    /// Diff `old` against `new` and submit the result against `base_version`.
    ///
    /// Line endings are normalized on both sides first. Returns `None`
    /// without contacting the server when the texts are identical.
    pub async fn submit_edit(
        &self,
        id: DocumentId,
        base_version: u64,
        old: &str,
        new: &str,
    ) -> Result<Option<ApplyResponse>> {
        let operations = diff(&normalize_line_endings(old), &normalize_line_endings(new));
        if operations.is_noop() {
            tracing::debug!(document = %id, base_version, "edit is a no-op, not submitted");
            return Ok(None);
        }
        self.apply_changes(id, base_version, operations.into_operations())
            .await
            .map(Some)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("base URL {} cannot hold a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        if_match: Option<&Fingerprint>,
    ) -> Result<T> {
        let mut attempt = 0;
        loop {
            match self.send_once(method.clone(), url.clone(), body, if_match).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = exponential_backoff(attempt, self.config.retry_delay_ms);
                    if self.config.enable_logging {
                        tracing::warn!(
                            "Request to {} failed (attempt {}), retrying after {:?}: {}",
                            url,
                            attempt + 1,
                            delay,
                            e
                        );
                    }
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        if_match: Option<&Fingerprint>,
    ) -> Result<T> {
        let mut request = self.http.request(method, url);
        if let Some(actor) = &self.config.actor {
            request = request.header(ACTOR_ID, actor);
        }
        if let Some(fingerprint) = if_match {
            request = request.header(reqwest::header::IF_MATCH, format_etag(fingerprint));
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let text = response.text().await.unwrap_or_default();
        Err(match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => Error::Remote {
                status: status.as_u16(),
                kind: body.error,
                message: body.message,
                current_version: body.current_version,
            },
            Err(_) => Error::Remote {
                status: status.as_u16(),
                kind: "http".to_string(),
                message: text,
                current_version: None,
            },
        })
    }
}
