//! Actor resolution for incoming requests.
//!
//! The [`IdentityLayer`] middleware resolves the acting user once per request
//! and attaches it to the request extensions, where handlers pick it up with
//! `Extension<ActorId>`:
//!
//! ```ignore
//! use axum::{Extension, Router, routing::post};
//! use cowrite::server::{HeaderIdentity, IdentityLayer};
//! use cowrite::ActorId;
//!
//! async fn handler(Extension(actor): Extension<ActorId>) -> String {
//!     actor.to_string()
//! }
//!
//! let layer = IdentityLayer::new(HeaderIdentity::default());
//! let app = Router::new()
//!     .route("/whoami", post(handler))
//!     .layer(axum::middleware::from_fn(layer.middleware()));
//! ```

use crate::protocol::ACTOR_ID;
use crate::types::ActorId;
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Maps request headers to the actor recorded on change records.
pub trait IdentityResolver: Send + Sync {
    /// The actor making the request. Never fails; unknown callers are anonymous.
    fn actor_for(&self, headers: &HeaderMap) -> ActorId;
}

/// Reads the actor id verbatim from a request header.
#[derive(Clone, Debug)]
pub struct HeaderIdentity {
    header: HeaderName,
}

impl HeaderIdentity {
    /// Resolve from `header` instead of `X-Actor-Id`.
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }

    /// The header being read.
    pub fn header(&self) -> &HeaderName {
        &self.header
    }
}

impl Default for HeaderIdentity {
    fn default() -> Self {
        Self::new(HeaderName::from_static(ACTOR_ID))
    }
}

impl IdentityResolver for HeaderIdentity {
    fn actor_for(&self, headers: &HeaderMap) -> ActorId {
        headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .map(ActorId::new)
            .unwrap_or_else(ActorId::anonymous)
    }
}

/// Middleware attaching the resolved [`ActorId`] to every request.
#[derive(Clone)]
pub struct IdentityLayer {
    resolver: Arc<dyn IdentityResolver>,
}

impl IdentityLayer {
    /// Wrap a resolver.
    pub fn new(resolver: impl IdentityResolver + 'static) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    /// Share an already boxed resolver.
    pub fn from_arc(resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { resolver }
    }

    /// Middleware function for use with [`axum::middleware::from_fn`].
    #[must_use]
    pub fn middleware(
        &self,
    ) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + Clone + 'static {
        let resolver = self.resolver.clone();

        move |mut req: Request, next: Next| {
            let actor = resolver.actor_for(req.headers());
            Box::pin(async move {
                req.extensions_mut().insert(actor);
                next.run(req).await
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_header_identity() {
        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_ID, HeaderValue::from_static("alice"));
        assert_eq!(HeaderIdentity::default().actor_for(&headers).as_str(), "alice");
    }

    #[test]
    fn test_missing_or_blank_header_is_anonymous() {
        let resolver = HeaderIdentity::default();
        assert!(resolver.actor_for(&HeaderMap::new()).is_anonymous());

        let mut headers = HeaderMap::new();
        headers.insert(ACTOR_ID, HeaderValue::from_static("   "));
        assert!(resolver.actor_for(&headers).is_anonymous());
    }

    #[test]
    fn test_custom_header() {
        let resolver = HeaderIdentity::new(HeaderName::from_static("x-user"));
        let mut headers = HeaderMap::new();
        headers.insert("x-user", HeaderValue::from_static("bob"));
        headers.insert(ACTOR_ID, HeaderValue::from_static("alice"));
        assert_eq!(resolver.actor_for(&headers).as_str(), "bob");
    }
}
