//! Key-value adapter used by every store on the board.
//!
//! This module provides:
//! - The `KvStore` trait (get/set with optional TTL)
//! - A remote REST backend (Upstash / Vercel KV command protocol)
//! - A local SQLite backend
//! - A non-durable in-memory fallback

pub mod memory;
pub mod rest;
pub mod sqlite;

pub use memory::MemoryKv;
pub use rest::RestKv;
pub use sqlite::SqliteKv;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Key holding the current status flag.
pub const STATUS_KEY: &str = "sauna:status";
/// Key holding the JSON array of push subscriptions.
pub const SUBSCRIPTIONS_KEY: &str = "sauna:subscriptions";
/// Prefix for issued bearer tokens.
pub const TOKEN_KEY_PREFIX: &str = "auth:token:";

/// Errors raised by a key-value backend
#[derive(Error, Debug)]
pub enum KvError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend rejected command: {0}")]
    Backend(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Malformed reply: {0}")]
    Decode(String),
}

/// Result type for key-value operations
pub type KvResult<T> = std::result::Result<T, KvError>;

/// Minimal string key-value contract shared by all backends.
///
/// Backends do not retry. A failed call is reported once and the caller decides
/// whether that is fatal.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch a value, `None` when absent or expired.
    async fn get(&self, key: &str) -> KvResult<Option<String>>;

    /// Store a value, optionally expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()>;

    /// Short backend label for logs.
    fn backend_name(&self) -> &'static str;
}

/// Connection settings for picking a backend.
#[derive(Debug, Clone, Default)]
pub struct KvConfig {
    pub rest_url: Option<String>,
    pub rest_token: Option<String>,
    pub sqlite_path: Option<PathBuf>,
}

/// Open the configured backend.
///
/// Preference order is remote REST, then SQLite, then the in-memory fallback.
/// Falling back to memory is not an error, but nothing written will survive a
/// restart.
pub fn open_store(config: &KvConfig) -> KvResult<Arc<dyn KvStore>> {
    let rest = RestKv::from_config(config.rest_url.as_deref(), config.rest_token.as_deref())?;
    if let Some(rest) = rest {
        tracing::info!("Using remote KV store at {}", rest.url());
        return Ok(Arc::new(rest));
    }

    if let Some(path) = &config.sqlite_path {
        tracing::info!("Using SQLite KV store at {}", path.display());
        return Ok(Arc::new(SqliteKv::open(path)?));
    }

    tracing::warn!("KV store not configured, using in-memory state that will not persist");
    Ok(Arc::new(MemoryKv::new()))
}

/// Whole seconds for a TTL, never below one so a short TTL still expires.
pub(crate) fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
