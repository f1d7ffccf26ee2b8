//! Login and token verification handlers.

use crate::auth::{bearer_token, password_matches};
use crate::error::{json_body, ApiError};
use crate::rate_limit::client_key;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{Extensions, HeaderMap};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// Milliseconds until the token expires
    pub expires_in: i64,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub token: Option<String>,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    extensions: Extensions,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let client = client_key(&headers, &extensions, state.trust_forwarded_for);
    if !state.login_limiter.check(&client) {
        tracing::warn!("Login rate limit hit for {}", client);
        return Err(ApiError::RateLimited("Too many login attempts".to_string()));
    }

    let password = json_body(body)?
        .and_then(|req| req.password)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Password is required".to_string()))?;

    if !password_matches(&password, &state.admin_password) {
        tracing::info!("Rejected login from {}", client);
        return Err(ApiError::Auth("Invalid password".to_string()));
    }

    let issued = state
        .tokens
        .issue()
        .await
        .map_err(|e| ApiError::internal("Login failed", e))?;

    Ok(Json(LoginResponse {
        expires_in: issued.expires_in_ms(),
        token: issued.value,
    }))
}

pub async fn verify_header(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<VerifyResponse>, ApiError> {
    check_token(&state, bearer_token(&headers)).await
}

/// POST variant: the header wins, otherwise `{token}` in the body.
pub async fn verify_body(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let from_body = json_body(body)?.and_then(|req| req.token);
    let token = bearer_token(&headers).or(from_body.as_deref());
    check_token(&state, token).await
}

async fn check_token(
    state: &AppState,
    token: Option<&str>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Auth("No token provided".to_string()))?;

    if state.tokens.verify(token).await {
        Ok(Json(VerifyResponse { valid: true }))
    } else {
        Err(ApiError::Auth("Invalid or expired token".to_string()))
    }
}
