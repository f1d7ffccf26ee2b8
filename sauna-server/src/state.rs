use std::sync::Arc;

use chrono::Duration;
use sauna_core::{open_store, KvStore, PushRegistry, StatusStore, TokenStore, VapidKeys};

use crate::config::BoardConfig;
use crate::rate_limit::RateLimiter;

/// Everything a handler needs, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub tokens: TokenStore,
    pub status: StatusStore,
    pub push: PushRegistry,
    pub vapid: VapidKeys,
    pub admin_password: Arc<str>,
    pub login_limiter: RateLimiter,
    pub trust_forwarded_for: bool,
}

impl AppState {
    pub fn new(config: &BoardConfig) -> anyhow::Result<Self> {
        let kv = open_store(&config.kv_config())?;
        Ok(Self::with_store(kv, config))
    }

    pub fn with_store(kv: Arc<dyn KvStore>, config: &BoardConfig) -> Self {
        Self {
            tokens: TokenStore::new(kv.clone(), Duration::hours(config.token_ttl_hours)),
            status: StatusStore::new(kv.clone()),
            push: PushRegistry::new(kv),
            vapid: VapidKeys::new(
                config.vapid_public_key.clone(),
                config.vapid_private_key.clone(),
            ),
            admin_password: Arc::from(config.admin_password.as_str()),
            login_limiter: RateLimiter::new(config.login_attempts_per_minute),
            trust_forwarded_for: config.trust_forwarded_for,
        }
    }
}
