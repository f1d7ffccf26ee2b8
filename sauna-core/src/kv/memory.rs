//! In-process fallback store. Nothing survives a restart.

use super::{KvError, KvResult, KvStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct Slot {
    value: String,
    expires_at: Option<Instant>,
}

#[derive(Clone, Default)]
pub struct MemoryKv {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| KvError::Lock(e.to_string()))?;

        let expired = match slots.get(key) {
            Some(slot) => slot.expires_at.is_some_and(|at| Instant::now() >= at),
            None => return Ok(None),
        };

        if expired {
            slots.remove(key);
            return Ok(None);
        }

        Ok(slots.get(key).map(|slot| slot.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|e| KvError::Lock(e.to_string()))?;

        let now = Instant::now();
        slots.retain(|_, slot| slot.expires_at.map_or(true, |at| now < at));
        slots.insert(
            key.to_string(),
            Slot {
                value: value.to_string(),
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_missing_key() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let kv = MemoryKv::new();
        kv.set("k", "one", None).await.unwrap();
        kv.set("k", "two", None).await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("two"));
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let kv = MemoryKv::new();
        kv.set("short", "v", Some(Duration::from_millis(20))).await.unwrap();
        assert!(kv.get("short").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(kv.get("short").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let kv = MemoryKv::new();
        let other = kv.clone();
        kv.set("shared", "yes", None).await.unwrap();
        assert_eq!(other.get("shared").await.unwrap().as_deref(), Some("yes"));
    }
}
