//! The single shared "is the sauna lit" flag.
//!
//! Writes are last-writer-wins with no versioning. Authorization is the
//! caller's job; this store accepts any well-formed write.

use crate::kv::{KvStore, STATUS_KEY};
use crate::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaunaStatus {
    Yes,
    #[default]
    No,
}

impl SaunaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

impl fmt::Display for SaunaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaunaStatus {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            other => Err(BoardError::Validation(format!(
                "Invalid status {:?}, must be \"yes\" or \"no\"",
                other
            ))),
        }
    }
}

#[derive(Clone)]
pub struct StatusStore {
    kv: Arc<dyn KvStore>,
}

impl StatusStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Current status. Missing or unreadable state reads as `No`.
    pub async fn read(&self) -> SaunaStatus {
        match self.kv.get(STATUS_KEY).await {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring unrecognised stored status {:?}", raw);
                SaunaStatus::default()
            }),
            Ok(None) => SaunaStatus::default(),
            Err(e) => {
                tracing::warn!("Failed to read status from {}: {}", self.kv.backend_name(), e);
                SaunaStatus::default()
            }
        }
    }

    /// Validate and persist a new status, returning the value read back.
    pub async fn write(&self, value: &str) -> Result<SaunaStatus> {
        let status: SaunaStatus = value.parse()?;

        self.kv.set(STATUS_KEY, status.as_str(), None).await?;

        let confirmed = self.kv.get(STATUS_KEY).await?;
        if confirmed.as_deref() != Some(status.as_str()) {
            return Err(BoardError::Inconsistent(format!(
                "wrote {:?} but read back {:?}",
                status.as_str(),
                confirmed
            )));
        }

        tracing::info!("Status updated to {}", status);
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::testing::{BrokenKv, ReadOnlyKv};
    use crate::kv::{KvResult, MemoryKv};
    use async_trait::async_trait;
    use std::time::Duration;

    fn memory_store() -> StatusStore {
        StatusStore::new(Arc::new(MemoryKv::new()))
    }

    #[test]
    fn test_parse_status() {
        assert_eq!("yes".parse::<SaunaStatus>().unwrap(), SaunaStatus::Yes);
        assert_eq!("no".parse::<SaunaStatus>().unwrap(), SaunaStatus::No);
        assert!("YES".parse::<SaunaStatus>().is_err());
        assert!("maybe".parse::<SaunaStatus>().is_err());
        assert!("".parse::<SaunaStatus>().is_err());
    }

    #[test]
    fn test_serde_form() {
        assert_eq!(serde_json::to_string(&SaunaStatus::Yes).unwrap(), "\"yes\"");
        let parsed: SaunaStatus = serde_json::from_str("\"no\"").unwrap();
        assert_eq!(parsed, SaunaStatus::No);
    }

    #[tokio::test]
    async fn test_defaults_to_no() {
        assert_eq!(memory_store().read().await, SaunaStatus::No);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let store = memory_store();
        assert_eq!(store.write("yes").await.unwrap(), SaunaStatus::Yes);
        assert_eq!(store.read().await, SaunaStatus::Yes);

        assert_eq!(store.write("no").await.unwrap(), SaunaStatus::No);
        assert_eq!(store.read().await, SaunaStatus::No);
    }

    #[tokio::test]
    async fn test_invalid_write_keeps_previous_value() {
        let store = memory_store();
        store.write("yes").await.unwrap();

        let result = store.write("maybe").await;
        assert!(matches!(result, Err(BoardError::Validation(_))));
        assert_eq!(store.read().await, SaunaStatus::Yes);
    }

    #[tokio::test]
    async fn test_read_failure_degrades_to_no() {
        let store = StatusStore::new(Arc::new(BrokenKv));
        assert_eq!(store.read().await, SaunaStatus::No);
    }

    #[tokio::test]
    async fn test_garbage_stored_value_reads_as_no() {
        let kv = MemoryKv::new();
        kv.set(STATUS_KEY, "on fire", None).await.unwrap();
        assert_eq!(StatusStore::new(Arc::new(kv)).read().await, SaunaStatus::No);
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let store = StatusStore::new(Arc::new(ReadOnlyKv {
            inner: MemoryKv::new(),
        }));
        assert!(matches!(store.write("yes").await, Err(BoardError::Storage(_))));
    }

    /// Accepts writes but drops them.
    struct ForgetfulKv;

    #[async_trait]
    impl KvStore for ForgetfulKv {
        async fn get(&self, _key: &str) -> KvResult<Option<String>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> KvResult<()> {
            Ok(())
        }

        fn backend_name(&self) -> &'static str {
            "forgetful"
        }
    }

    #[tokio::test]
    async fn test_write_detects_lost_update() {
        let store = StatusStore::new(Arc::new(ForgetfulKv));
        assert!(matches!(
            store.write("yes").await,
            Err(BoardError::Inconsistent(_))
        ));
    }
}
