//! Sauna Status Board Core Library
//!
//! Storage layer behind the status board: the key-value adapter and the three
//! stores built on it (admin tokens, the status flag, push subscriptions).
//! HTTP concerns live in the server crate.

pub mod kv;
pub mod push;
pub mod status;
pub mod tokens;

pub use kv::{open_store, KvConfig, KvError, KvStore, MemoryKv, RestKv, SqliteKv};
pub use push::{PushRegistry, SubscriptionEntry, VapidKeys};
pub use status::{SaunaStatus, StatusStore};
pub use tokens::{IssuedToken, TokenStore};

use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// General error type for board operations
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] KvError),

    #[error("Storage inconsistency: {0}")]
    Inconsistent(String),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl BoardError {
    /// Whether the caller sent bad input, as opposed to a backend problem.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
