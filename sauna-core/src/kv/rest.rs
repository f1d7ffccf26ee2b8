//! Remote Redis-compatible REST backend.
//!
//! Speaks the Upstash / Vercel KV command protocol: every command is POSTed to
//! the base URL as a JSON array and answered with either
//! `{"result": ...}` or `{"error": "..."}`.
//!
//! ```text
//! POST <url>
//! Authorization: Bearer <token>
//! ["SET", "sauna:status", "yes"]
//! ```

use super::{ttl_seconds, KvError, KvResult, KvStore};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for a remote KV service.
pub struct RestKv {
    client: reqwest::Client,
    url: String,
    token: String,
}

impl RestKv {
    /// Build a client when both the URL and the access token are present.
    ///
    /// Returns `Ok(None)` when the service is not configured.
    pub fn from_config(url: Option<&str>, token: Option<&str>) -> KvResult<Option<Self>> {
        let (url, token) = match (url, token) {
            (Some(url), Some(token)) if !url.trim().is_empty() && !token.trim().is_empty() => {
                (url, token)
            }
            _ => return Ok(None),
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Some(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
        }))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn command(&self, args: &[&str]) -> KvResult<Option<Value>> {
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(args)
            .send()
            .await?;

        let status = resp.status();
        let reply: CommandReply = resp
            .json()
            .await
            .map_err(|e| KvError::Decode(format!("HTTP {}: {}", status, e)))?;

        if let Some(error) = reply.error {
            return Err(KvError::Backend(error));
        }
        if !status.is_success() {
            return Err(KvError::Backend(format!("HTTP {}", status)));
        }

        Ok(reply.result)
    }
}

/// Interpret a GET reply. Strings are returned as-is; other JSON values are
/// re-serialized, since the service may hand back decoded JSON.
fn reply_to_string(result: Option<Value>) -> Option<String> {
    match result {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    }
}

#[async_trait]
impl KvStore for RestKv {
    async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let result = self.command(&["GET", key]).await?;
        Ok(reply_to_string(result))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> KvResult<()> {
        match ttl {
            Some(ttl) => {
                let seconds = ttl_seconds(ttl).to_string();
                self.command(&["SET", key, value, "EX", seconds.as_str()]).await?;
            }
            None => {
                self.command(&["SET", key, value]).await?;
            }
        }
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_config_requires_both_values() {
        assert!(RestKv::from_config(None, None).unwrap().is_none());
        assert!(RestKv::from_config(Some("https://kv.example.com"), None)
            .unwrap()
            .is_none());
        assert!(RestKv::from_config(None, Some("token")).unwrap().is_none());
        assert!(RestKv::from_config(Some("  "), Some("token")).unwrap().is_none());
    }

    #[test]
    fn test_from_config_trims_url() {
        let kv = RestKv::from_config(Some("https://kv.example.com/"), Some("token"))
            .unwrap()
            .unwrap();
        assert_eq!(kv.url(), "https://kv.example.com");
    }

    #[test]
    fn test_reply_to_string() {
        assert_eq!(reply_to_string(None), None);
        assert_eq!(reply_to_string(Some(Value::Null)), None);
        assert_eq!(reply_to_string(Some(json!("yes"))).as_deref(), Some("yes"));
        assert_eq!(
            reply_to_string(Some(json!([{"timestamp": 1}]))).as_deref(),
            Some(r#"[{"timestamp":1}]"#)
        );
    }

    #[test]
    fn test_command_reply_decoding() {
        let ok: CommandReply = serde_json::from_str(r#"{"result":"OK"}"#).unwrap();
        assert_eq!(ok.result, Some(json!("OK")));
        assert!(ok.error.is_none());

        let err: CommandReply =
            serde_json::from_str(r#"{"error":"WRONGPASS invalid password"}"#).unwrap();
        assert!(err.result.is_none());
        assert_eq!(err.error.as_deref(), Some("WRONGPASS invalid password"));
    }
}
