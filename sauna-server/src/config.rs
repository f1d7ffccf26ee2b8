//! Board server configuration.

use sauna_core::tokens::DEFAULT_TOKEN_TTL_HOURS;
use sauna_core::KvConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Password used when none is configured. Fine for local development only.
pub const DEFAULT_ADMIN_PASSWORD: &str = "sauna2026";

/// Longest accepted token lifetime (one year).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub listen_addr: String,
    pub admin_password: String,
    pub kv_rest_api_url: Option<String>,
    pub kv_rest_api_token: Option<String>,
    pub storage_path: Option<PathBuf>,
    pub vapid_public_key: String,
    pub vapid_private_key: Option<String>,
    pub token_ttl_hours: i64,
    pub max_payload_size: usize,
    pub login_attempts_per_minute: u32,
    /// Key the login throttle on `X-Forwarded-For`. Only enable behind a proxy
    /// that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3001".to_string(),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            kv_rest_api_url: None,
            kv_rest_api_token: None,
            storage_path: None,
            vapid_public_key: String::new(),
            vapid_private_key: None,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            max_payload_size: 65_536,
            login_attempts_per_minute: 10,
            trust_forwarded_for: false,
        }
    }
}

impl BoardConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml_dep::from_str(&content)?;
        Ok(config)
    }

    pub fn kv_config(&self) -> KvConfig {
        KvConfig {
            rest_url: self.kv_rest_api_url.clone(),
            rest_token: self.kv_rest_api_token.clone(),
            sqlite_path: self.storage_path.clone(),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.admin_password.is_empty() {
            anyhow::bail!("admin_password must not be empty");
        }
        if self.token_ttl_hours <= 0 || self.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            anyhow::bail!("token_ttl_hours must be between 1 and {}", MAX_TOKEN_TTL_HOURS);
        }
        if self.login_attempts_per_minute == 0 {
            anyhow::bail!("login_attempts_per_minute must be at least 1");
        }
        Ok(())
    }

    pub fn uses_default_password(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD
    }
}
