//! HTTP surface over the change gate.
//!
//! # Module Organization
//!
//! ```text
//! server/
//! ├── config   - ServerConfig and environment overrides
//! ├── identity - actor resolution middleware
//! ├── response - error status mapping and versioned responses
//! └── routes   - document endpoints
//! ```
//!
//! See [`protocol`](crate::protocol) for the endpoint table and status codes.
//!
//! # Examples
//!
//! ```ignore
//! use cowrite::server::{self, ServerConfig};
//! use cowrite::store::InMemoryStore;
//!
//! let config = ServerConfig::from_env()?;
//! let app = server::app(InMemoryStore::new(), &config)?;
//! let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
//! axum::serve(listener, app).await?;
//! ```

mod config;
mod identity;
mod response;
mod routes;

pub use config::ServerConfig;
pub use identity::{HeaderIdentity, IdentityLayer, IdentityResolver};
pub use response::Versioned;
pub use routes::{app, router};
