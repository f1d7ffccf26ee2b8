//! Push subscription registry.
//!
//! A best-effort mailing list of browser push destinations, keyed by the
//! subscription `endpoint`. Entries not refreshed within the retention window
//! are swept out whenever the list is touched; there is no background timer.
//!
//! Delivery is not done here. A sender takes `list_active()` and the
//! `VapidKeys` and talks to the push service itself.

use crate::kv::{KvStore, SUBSCRIPTIONS_KEY};
use crate::{BoardError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Subscriptions older than this are dropped.
pub const RETENTION_DAYS: i64 = 30;

/// A stored subscription and when it was last (re)registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionEntry {
    pub subscription: Value,
    /// Unix milliseconds
    pub timestamp: i64,
}

impl SubscriptionEntry {
    fn endpoint(&self) -> Option<&str> {
        endpoint_of(&self.subscription)
    }
}

/// The `endpoint` of a browser subscription, if it has a usable one.
pub fn endpoint_of(descriptor: &Value) -> Option<&str> {
    descriptor
        .get("endpoint")
        .and_then(Value::as_str)
        .filter(|endpoint| !endpoint.trim().is_empty())
}

#[derive(Clone)]
pub struct PushRegistry {
    kv: Arc<dyn KvStore>,
    retention: Duration,
}

impl PushRegistry {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            retention: Duration::days(RETENTION_DAYS),
        }
    }

    /// Add or refresh a subscription, returning the new number of entries.
    pub async fn register(&self, descriptor: Value) -> Result<usize> {
        self.register_at(descriptor, Utc::now()).await
    }

    pub async fn register_at(&self, descriptor: Value, now: DateTime<Utc>) -> Result<usize> {
        let endpoint = endpoint_of(&descriptor)
            .ok_or_else(|| {
                BoardError::Validation("Subscription must have a non-empty endpoint".to_string())
            })?
            .to_string();

        let (mut entries, _) = self.load_pruned(now).await;
        let timestamp = now.timestamp_millis();

        match entries
            .iter_mut()
            .find(|entry| entry.endpoint() == Some(endpoint.as_str()))
        {
            Some(existing) => {
                existing.subscription = descriptor;
                existing.timestamp = timestamp;
            }
            None => entries.push(SubscriptionEntry {
                subscription: descriptor,
                timestamp,
            }),
        }

        self.save(&entries).await?;
        tracing::info!("Subscription stored. Total subscriptions: {}", entries.len());
        Ok(entries.len())
    }

    /// Subscriptions still inside the retention window.
    pub async fn list_active(&self) -> Vec<Value> {
        self.list_active_at(Utc::now()).await
    }

    pub async fn list_active_at(&self, now: DateTime<Utc>) -> Vec<Value> {
        let (entries, pruned) = self.load_pruned(now).await;

        if pruned > 0 {
            if let Err(e) = self.save(&entries).await {
                tracing::warn!("Failed to persist pruned subscriptions: {}", e);
            }
        }

        entries.into_iter().map(|entry| entry.subscription).collect()
    }

    /// Load the collection and drop stale entries. Returns how many were dropped.
    async fn load_pruned(&self, now: DateTime<Utc>) -> (Vec<SubscriptionEntry>, usize) {
        let mut entries = self.load().await;
        let before = entries.len();
        let cutoff = self.retention.num_milliseconds();

        entries.retain(|entry| now.timestamp_millis() - entry.timestamp < cutoff);

        let pruned = before - entries.len();
        if pruned > 0 {
            tracing::debug!("Pruned {} expired subscriptions", pruned);
        }
        (entries, pruned)
    }

    async fn load(&self) -> Vec<SubscriptionEntry> {
        let raw = match self.kv.get(SUBSCRIPTIONS_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(
                    "Failed to read subscriptions from {}: {}",
                    self.kv.backend_name(),
                    e
                );
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("Discarding undecodable subscription list: {}", e);
            Vec::new()
        })
    }

    async fn save(&self, entries: &[SubscriptionEntry]) -> Result<()> {
        let encoded = serde_json::to_string(entries)?;
        self.kv
            .set(SUBSCRIPTIONS_KEY, &encoded, None)
            .await
            .inspect_err(|e| tracing::error!("Failed to write subscriptions: {}", e))?;
        Ok(())
    }
}

/// VAPID key pair used by a push sender to identify itself.
#[derive(Debug, Clone, Default)]
pub struct VapidKeys {
    public_key: String,
    private_key: Option<String>,
}

impl VapidKeys {
    pub fn new(public_key: impl Into<String>, private_key: Option<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key,
        }
    }

    /// Public half, handed to browsers when they subscribe. Empty if unset.
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn private_key(&self) -> Option<&str> {
        self.private_key.as_deref()
    }
}
