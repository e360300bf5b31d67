//! Demo cowrite server backed by the in-memory store.
//!
//! Run with: cargo run --example server
//!
//! Configure with `COWRITE_BIND_ADDR`, `COWRITE_MAX_COMMIT_RETRIES` and
//! friends; set `RUST_LOG` to change verbosity.

use anyhow::Context;
use cowrite::server::{self, ServerConfig};
use cowrite::InMemoryStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cowrite=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env().context("reading configuration")?;
    let app = server::app(InMemoryStore::new(), &config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "cowrite listening");

    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}
