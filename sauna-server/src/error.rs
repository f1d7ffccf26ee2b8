//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt::Display;

/// API error types mapped to HTTP status codes.
///
/// Every variant carries the message shown to the client. Internal details are
/// logged where the error is raised, never returned.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Auth(String),
    MethodNotAllowed,
    PayloadTooLarge,
    RateLimited(String),
    Internal(String),
}

impl ApiError {
    /// Log `source` and produce a 500 that only shows `public`.
    pub fn internal(public: &str, source: impl Display) -> Self {
        tracing::error!("{}: {}", public, source);
        Self::Internal(public.to_string())
    }
}

/// Unwrap an optional JSON body.
///
/// A body over the size limit is its own error. Any other rejection counts as
/// no usable body and is left to the handler's validation message.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<Option<T>, ApiError> {
    match body {
        Ok(Json(value)) => Ok(Some(value)),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(ApiError::PayloadTooLarge)
        }
        Err(_) => Ok(None),
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(e) => write!(f, "Bad request: {}", e),
            Self::Auth(e) => write!(f, "Auth error: {}", e),
            Self::MethodNotAllowed => write!(f, "Method not allowed"),
            Self::PayloadTooLarge => write!(f, "Payload too large"),
            Self::RateLimited(e) => write!(f, "Rate limited: {}", e),
            Self::Internal(e) => write!(f, "Internal error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(e) => (StatusCode::BAD_REQUEST, e),
            Self::Auth(e) => (StatusCode::UNAUTHORIZED, e),
            Self::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed".to_string(),
            ),
            Self::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Payload too large".to_string(),
            ),
            Self::RateLimited(e) => (StatusCode::TOO_MANY_REQUESTS, e),
            Self::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, e),
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
