//! Sauna Status Board Server
//!
//! Serves the lit/unlit flag for the sauna, lets the admin flip it with a
//! bearer token, and keeps a registry of browser push subscriptions.

mod auth;
mod config;
mod error;
mod handlers;
mod rate_limit;
mod server;
mod state;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sauna-server", about = "Sauna status board API server")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "sauna.toml")]
    config: PathBuf,

    /// Listen address override
    #[arg(short, long, env = "SAUNA_LISTEN")]
    listen: Option<String>,

    /// SQLite database path, used when no remote KV store is configured
    #[arg(short, long, env = "SAUNA_DATABASE")]
    database: Option<PathBuf>,

    /// Admin password
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Remote KV REST endpoint
    #[arg(long, env = "KV_REST_API_URL")]
    kv_rest_api_url: Option<String>,

    /// Remote KV access token
    #[arg(long, env = "KV_REST_API_TOKEN", hide_env_values = true)]
    kv_rest_api_token: Option<String>,

    /// VAPID public key handed to subscribing browsers
    #[arg(long, env = "VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,

    /// VAPID private key for the push sender
    #[arg(long, env = "VAPID_PRIVATE_KEY", hide_env_values = true)]
    vapid_private_key: Option<String>,
}

impl Cli {
    /// Overlay flags and env vars on the file config. An empty value counts as
    /// unset, so `ADMIN_PASSWORD=` keeps the configured password.
    fn apply(self, cfg: &mut config::BoardConfig) {
        if let Some(listen) = non_empty(self.listen) {
            cfg.listen_addr = listen;
        }
        if let Some(database) = self.database.filter(|p| !p.as_os_str().is_empty()) {
            cfg.storage_path = Some(database);
        }
        if let Some(password) = non_empty(self.admin_password) {
            cfg.admin_password = password;
        }
        if let Some(url) = non_empty(self.kv_rest_api_url) {
            cfg.kv_rest_api_url = Some(url);
        }
        if let Some(token) = non_empty(self.kv_rest_api_token) {
            cfg.kv_rest_api_token = Some(token);
        }
        if let Some(key) = non_empty(self.vapid_public_key) {
            cfg.vapid_public_key = key;
        }
        if let Some(key) = non_empty(self.vapid_private_key) {
            cfg.vapid_private_key = Some(key);
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut cfg = if cli.config.exists() {
        config::BoardConfig::load(&cli.config)?
    } else {
        tracing::info!("No config file found, using defaults");
        config::BoardConfig::default()
    };
    cli.apply(&mut cfg);
    cfg.validate()?;

    if cfg.uses_default_password() {
        tracing::warn!("ADMIN_PASSWORD not set, using the built-in development password");
    }
    if cfg.vapid_public_key.is_empty() {
        tracing::warn!("VAPID_PUBLIC_KEY not set, browsers will not be able to subscribe");
    }

    tracing::info!("Starting sauna board on {}", cfg.listen_addr);

    let state = state::AppState::new(&cfg)?;
    let app = server::build_router(state, &cfg);

    let listener = tokio::net::TcpListener::bind(&cfg.listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli() -> Cli {
        Cli {
            config: PathBuf::from("sauna.toml"),
            listen: None,
            database: None,
            admin_password: None,
            kv_rest_api_url: None,
            kv_rest_api_token: None,
            vapid_public_key: None,
            vapid_private_key: None,
        }
    }

    #[test]
    fn test_empty_overrides_are_ignored() {
        let mut cfg = config::BoardConfig::default();
        Cli {
            admin_password: Some(String::new()),
            kv_rest_api_url: Some(String::new()),
            vapid_public_key: Some(String::new()),
            ..cli()
        }
        .apply(&mut cfg);

        assert!(cfg.uses_default_password());
        assert!(cfg.kv_rest_api_url.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut cfg = config::BoardConfig::default();
        Cli {
            listen: Some("0.0.0.0:8080".to_string()),
            admin_password: Some("hunter2".to_string()),
            database: Some(PathBuf::from("board.db")),
            ..cli()
        }
        .apply(&mut cfg);

        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.admin_password, "hunter2");
        assert_eq!(cfg.storage_path, Some(PathBuf::from("board.db")));
    }
}
