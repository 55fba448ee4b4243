//! Health and whole-system status endpoints

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use rigstate_api::HealthResponse;

use crate::api::error::AppError;
use crate::state::AppState;

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    responses((status = 200, description = "Daemon is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Uptime, CPU load, CPU temperature and memory usage
///
/// # Errors
/// Returns `AppError` if the sampling task fails
#[utoipa::path(
    get,
    path = "/api/v1/system",
    tag = "System",
    responses(
        (status = 200, description = "System status sample", body = serde_json::Value),
        (status = 500, description = "Sampling failed", body = crate::api::ApiError)
    )
)]
pub async fn system_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.system_status().await?))
}
