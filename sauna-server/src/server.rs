//! Axum router setup.

use crate::auth::require_bearer;
use crate::config::BoardConfig;
use crate::handlers::{auth, health, method_not_allowed, preflight, push, status};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState, config: &BoardConfig) -> Router {
    // Only writes to the status need a token
    let authenticated_write = post(status::write_status).route_layer(
        middleware::from_fn_with_state(state.clone(), require_bearer),
    );

    Router::new()
        .route(
            "/api/auth/login",
            post(auth::login)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/auth/verify",
            get(auth::verify_header)
                .post(auth::verify_body)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/status",
            get(status::read_status)
                .merge(authenticated_write)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/push/subscribe",
            post(push::subscribe)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/push/vapid-public-key",
            get(push::vapid_public_key)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route("/health", get(health))
        // Enforced by the JSON extractors, so an oversized body gets a JSON 413
        .layer(DefaultBodyLimit::max(config.max_payload_size))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
