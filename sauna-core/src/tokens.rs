//! Opaque bearer tokens for the board admin.
//!
//! A token carries no claims. It is valid exactly while a record for it exists
//! in the key-value store and its recorded expiry lies in the future, so losing
//! the store invalidates every outstanding token.

use crate::kv::{KvStore, TOKEN_KEY_PREFIX};
use crate::{BoardError, Result};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default token lifetime.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Random bytes per token (hex-encoded to twice this length).
pub const TOKEN_BYTES: usize = 32;

/// A freshly issued token, handed to the client once.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Lifetime in milliseconds, as reported to the client.
    pub fn expires_in_ms(&self) -> i64 {
        (self.expires_at - self.issued_at).num_milliseconds()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    issued_at: i64,
    expires_at: i64,
}

#[derive(Clone)]
pub struct TokenStore {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl TokenStore {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Create with the default 24 hour lifetime
    pub fn with_default_ttl(kv: Arc<dyn KvStore>) -> Self {
        Self::new(kv, Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue and persist a new token.
    ///
    /// Fails if the token cannot be stored; an unstored token is never handed out.
    pub async fn issue(&self) -> Result<IssuedToken> {
        self.issue_at(Utc::now()).await
    }

    pub async fn issue_at(&self, now: DateTime<Utc>) -> Result<IssuedToken> {
        let mut secret = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut secret);
        let value = hex::encode(secret);

        let expires_at = now + self.ttl;
        let record = TokenRecord {
            issued_at: now.timestamp_millis(),
            expires_at: expires_at.timestamp_millis(),
        };
        let encoded = serde_json::to_string(&record)?;

        let ttl = self
            .ttl
            .to_std()
            .map_err(|e| BoardError::Validation(format!("Invalid token TTL: {}", e)))?;

        self.kv
            .set(&token_key(&value), &encoded, Some(ttl))
            .await
            .inspect_err(|e| {
                tracing::error!("Failed to store token in {}: {}", self.kv.backend_name(), e)
            })?;

        tracing::info!("Token issued, expires at {}", expires_at);
        Ok(IssuedToken {
            value,
            issued_at: now,
            expires_at,
        })
    }

    /// Check a presented token. Never errors; anything doubtful is invalid.
    pub async fn verify(&self, value: &str) -> bool {
        self.verify_at(value, Utc::now()).await
    }

    pub async fn verify_at(&self, value: &str, now: DateTime<Utc>) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }

        let stored = match self.kv.get(&token_key(value)).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                tracing::debug!("Token not found");
                return false;
            }
            Err(e) => {
                tracing::warn!("Failed to read token from {}: {}", self.kv.backend_name(), e);
                return false;
            }
        };

        match serde_json::from_str::<TokenRecord>(&stored) {
            Ok(record) => now.timestamp_millis() < record.expires_at,
            Err(e) => {
                tracing::warn!("Discarding undecodable token record: {}", e);
                false
            }
        }
    }
}

fn token_key(value: &str) -> String {
    format!("{}{}", TOKEN_KEY_PREFIX, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::testing::{BrokenKv, ReadOnlyKv};
    use crate::kv::{MemoryKv, SqliteKv};

    fn memory_store() -> TokenStore {
        TokenStore::with_default_ttl(Arc::new(MemoryKv::new()))
    }

    #[tokio::test]
    async fn test_issue_format() {
        let store = memory_store();
        let token = store.issue().await.unwrap();

        assert_eq!(token.value.len(), 64);
        assert!(token.value.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(token.expires_in_ms(), 86_400_000);
    }

    #[tokio::test]
    async fn test_issued_token_verifies() {
        let store = memory_store();
        let token = store.issue().await.unwrap();
        assert!(store.verify(&token.value).await);
    }

    #[tokio::test]
    async fn test_unknown_tokens_rejected() {
        let store = memory_store();
        store.issue().await.unwrap();

        assert!(!store.verify("").await);
        assert!(!store.verify("   ").await);
        assert!(!store.verify(&"a".repeat(64)).await);
        assert!(!store.verify("not-a-token").await);
    }

    #[tokio::test]
    async fn test_tokens_are_distinct() {
        let store = memory_store();
        let a = store.issue().await.unwrap();
        let b = store.issue().await.unwrap();
        assert_ne!(a.value, b.value);
    }

    #[tokio::test]
    async fn test_expiry_with_simulated_clock() {
        let store = memory_store();
        let issued = Utc::now();
        let token = store.issue_at(issued).await.unwrap();

        assert!(store.verify_at(&token.value, issued + Duration::hours(23)).await);
        assert!(!store.verify_at(&token.value, issued + Duration::hours(24)).await);
        assert!(!store.verify_at(&token.value, issued + Duration::days(3)).await);
    }

    #[tokio::test]
    async fn test_custom_ttl() {
        let store = TokenStore::new(Arc::new(SqliteKv::in_memory().unwrap()), Duration::hours(1));
        let issued = Utc::now();
        let token = store.issue_at(issued).await.unwrap();

        assert_eq!(token.expires_in_ms(), 3_600_000);
        assert!(store.verify_at(&token.value, issued + Duration::minutes(59)).await);
        assert!(!store.verify_at(&token.value, issued + Duration::minutes(61)).await);
    }

    #[tokio::test]
    async fn test_issue_fails_when_store_rejects_write() {
        let store = TokenStore::with_default_ttl(Arc::new(ReadOnlyKv {
            inner: MemoryKv::new(),
        }));
        let result = store.issue().await;
        assert!(matches!(result, Err(BoardError::Storage(_))));
    }

    #[tokio::test]
    async fn test_verify_fails_closed_on_read_error() {
        let store = TokenStore::with_default_ttl(Arc::new(BrokenKv));
        assert!(!store.verify(&"f".repeat(64)).await);
    }

    #[tokio::test]
    async fn test_fresh_store_knows_no_tokens() {
        let store = memory_store();
        let token = store.issue().await.unwrap();

        // A new backend (cold start) has no record of earlier tokens.
        let restarted = memory_store();
        assert!(!restarted.verify(&token.value).await);
    }

    #[tokio::test]
    async fn test_garbage_record_is_invalid() {
        let kv = MemoryKv::new();
        kv.set(&token_key("abc"), "1", None).await.unwrap();
        let store = TokenStore::with_default_ttl(Arc::new(kv));
        assert!(!store.verify("abc").await);
    }
}
