//! HTTP handler shells. Each one adapts a request to a core store call.

pub mod auth;
pub mod push;
pub mod status;

use crate::error::ApiError;
use axum::http::StatusCode;

/// Bare 200 for CORS preflight and plain OPTIONS probes.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn health() -> &'static str {
    "ok"
}
