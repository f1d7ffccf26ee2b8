//! Push subscription and VAPID key handlers.

use crate::error::{json_body, ApiError};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const INVALID_SUBSCRIPTION: &str = "Invalid subscription data";

#[derive(Deserialize)]
pub struct SubscribeRequest {
    pub subscription: Option<Value>,
}

#[derive(Serialize)]
pub struct SubscribeResponse {
    pub success: bool,
    pub count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VapidKeyResponse {
    pub public_key: String,
}

pub async fn subscribe(
    State(state): State<AppState>,
    body: Result<Json<SubscribeRequest>, JsonRejection>,
) -> Result<Json<SubscribeResponse>, ApiError> {
    let subscription = json_body(body)?
        .and_then(|req| req.subscription)
        .ok_or_else(|| ApiError::BadRequest(INVALID_SUBSCRIPTION.to_string()))?;

    let count = state.push.register(subscription).await.map_err(|e| {
        if e.is_validation() {
            ApiError::BadRequest(INVALID_SUBSCRIPTION.to_string())
        } else {
            ApiError::internal("Failed to store subscription", e)
        }
    })?;

    Ok(Json(SubscribeResponse {
        success: true,
        count,
    }))
}

pub async fn vapid_public_key(State(state): State<AppState>) -> Json<VapidKeyResponse> {
    Json(VapidKeyResponse {
        public_key: state.vapid.public_key().to_string(),
    })
}
