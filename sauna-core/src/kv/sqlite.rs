//! SQLite backend for self-hosted boards without a remote KV service.

use super::{ttl_seconds, KvError, KvResult, KvStore};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Thread-safe SQLite key-value table.
#[derive(Clone)]
pub struct SqliteKv {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteKv {
    pub fn open(path: &Path) -> KvResult<Self> {
        let conn = Connection::open(path)?;
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> KvResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> KvResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER
            );

            CREATE INDEX IF NOT EXISTS idx_kv_expires_at
                ON kv(expires_at);",
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> KvResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| KvError::Lock(e.to_string()))
    }
}

#[async_trait]
impl KvStore for SqliteKv {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let conn = self.conn()?;
        let now = Utc::now().timestamp();

        let value = conn
            .query_row(
                "SELECT value FROM kv
                 WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                rusqlite::params![key, now],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()> {
        let conn = self.conn()?;
        let now = Utc::now().timestamp();
        let expires_at = ttl.map(|ttl| now + ttl_seconds(ttl) as i64);

        // Expired rows are only ever purged here.
        conn.execute(
            "DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            [now],
        )?;

        conn.execute(
            "INSERT INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at",
            rusqlite::params![key, value, expires_at],
        )?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let kv = SqliteKv::in_memory().unwrap();
        assert_eq!(kv.get("sauna:status").await.unwrap(), None);

        kv.set("sauna:status", "yes", None).await.unwrap();
        assert_eq!(kv.get("sauna:status").await.unwrap().as_deref(), Some("yes"));

        kv.set("sauna:status", "no", None).await.unwrap();
        assert_eq!(kv.get("sauna:status").await.unwrap().as_deref(), Some("no"));
    }

    #[tokio::test]
    async fn test_expired_rows_are_hidden_and_purged() {
        let kv = SqliteKv::in_memory().unwrap();
        {
            let conn = kv.conn().unwrap();
            conn.execute(
                "INSERT INTO kv (key, value, expires_at) VALUES ('old', 'v', ?1)",
                [Utc::now().timestamp() - 10],
            )
            .unwrap();
        }

        assert_eq!(kv.get("old").await.unwrap(), None);

        kv.set("fresh", "v", Some(Duration::from_secs(60))).await.unwrap();
        let remaining: i64 = kv
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM kv", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn test_ttl_is_stored() {
        let kv = SqliteKv::in_memory().unwrap();
        kv.set("token", "v", Some(Duration::from_secs(3600))).await.unwrap();

        let expires_at: Option<i64> = kv
            .conn()
            .unwrap()
            .query_row("SELECT expires_at FROM kv WHERE key = 'token'", [], |row| {
                row.get(0)
            })
            .unwrap();
        let delta = expires_at.unwrap() - Utc::now().timestamp();
        assert!((3590..=3600).contains(&delta));
    }
}
