//! Status read/write handlers.

use crate::error::{json_body, ApiError};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use sauna_core::SaunaStatus;
use serde::{Deserialize, Serialize};

const INVALID_STATUS: &str = "Invalid status. Must be \"yes\" or \"no\"";

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: SaunaStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

pub async fn read_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.status.read().await,
        message: None,
    })
}

/// Runs behind the bearer middleware; no auth check here.
pub async fn write_status(
    State(state): State<AppState>,
    body: Result<Json<StatusUpdate>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let requested = json_body(body)?
        .and_then(|update| update.status)
        .ok_or_else(|| ApiError::BadRequest(INVALID_STATUS.to_string()))?;

    let status = state.status.write(&requested).await.map_err(|e| {
        if e.is_validation() {
            ApiError::BadRequest(INVALID_STATUS.to_string())
        } else {
            ApiError::internal("Failed to update status", e)
        }
    })?;

    Ok(Json(StatusResponse {
        status,
        message: Some("Status updated"),
    }))
}
