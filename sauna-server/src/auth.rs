//! Bearer token auth middleware and admin password check.

use crate::error::ApiError;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

/// Auth middleware: requires a live bearer token on the wrapped route.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ApiError::Auth("Authentication required".to_string()))?;

    if !state.tokens.verify(token).await {
        return Err(ApiError::Auth("Invalid or expired token".to_string()));
    }

    Ok(next.run(request).await)
}

/// Token from an `Authorization: Bearer <token>` header, if present and non-empty.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Compare a submitted password against the configured one in constant time.
pub fn password_matches(submitted: &str, expected: &str) -> bool {
    submitted.as_bytes().ct_eq(expected.as_bytes()).into()
}
