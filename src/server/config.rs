//! Server configuration.

use crate::error::{Error, Result};
use crate::gate::GateConfig;
use crate::protocol::ACTOR_ID;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::str::FromStr;

/// Configuration for the HTTP server.
///
/// # Examples
///
/// ```
/// use cowrite::server::ServerConfig;
///
/// let config = ServerConfig::default();
/// assert_eq!(config.bind_addr.port(), 3000);
/// assert_eq!(config.actor_header, "x-actor-id");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to.
    pub bind_addr: SocketAddr,
    /// Request header carrying the actor id.
    pub actor_header: String,
    /// Settings for the change gate.
    pub gate: GateConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            actor_header: ACTOR_ID.to_string(),
            gate: GateConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Environment variable prefix.
    pub const ENV_PREFIX: &'static str = "COWRITE_";

    /// Defaults overridden by `COWRITE_*` environment variables.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `COWRITE_BIND_ADDR` | `bind_addr` |
    /// | `COWRITE_ACTOR_HEADER` | `actor_header` |
    /// | `COWRITE_MAX_COMMIT_RETRIES` | `gate.max_commit_retries` |
    /// | `COWRITE_HISTORY_PAGE_SIZE` | `gate.history_page_size` |
    /// | `COWRITE_MAX_HISTORY_PAGE` | `gate.max_history_page` |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(&format!("{}{}", Self::ENV_PREFIX, name));
        let mut config = Self::default();

        if let Some(value) = var("BIND_ADDR") {
            config.bind_addr = parse("BIND_ADDR", &value)?;
        }
        if let Some(value) = var("ACTOR_HEADER") {
            config.actor_header = value.trim().to_ascii_lowercase();
        }
        if let Some(value) = var("MAX_COMMIT_RETRIES") {
            config.gate.max_commit_retries = parse("MAX_COMMIT_RETRIES", &value)?;
        }
        if let Some(value) = var("HISTORY_PAGE_SIZE") {
            config.gate.history_page_size = parse("HISTORY_PAGE_SIZE", &value)?;
        }
        if let Some(value) = var("MAX_HISTORY_PAGE") {
            config.gate.max_history_page = parse("MAX_HISTORY_PAGE", &value)?;
        }
        Ok(config)
    }
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|err| Error::Config(format!("{}{name}={value:?}: {err}", ServerConfig::ENV_PREFIX)))
}
