//! Hardware inventory and GPU control endpoints

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use rigstate_api::{OverclockRequest, OverclockResponse, OverclockStatus, RescanResponse};
use rigstate_inventory::Guid;
use tracing::info;

use crate::api::error::{ApiError, AppError};
use crate::state::AppState;

/// Static attributes of every hardware record
///
/// # Errors
/// Returns `AppError` if the inventory task fails
#[utoipa::path(
    get,
    path = "/api/v1/hardware",
    tag = "Hardware",
    responses(
        (status = 200, description = "Static inventory snapshot", body = serde_json::Value),
        (status = 500, description = "Inventory unavailable", body = ApiError)
    )
)]
pub async fn get_hardware(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state
        .with_inventory(|inventory, _| inventory.static_snapshot())
        .await?;
    Ok(Json(snapshot))
}

/// Latest sensor readings, keyed by GUID
///
/// # Errors
/// Returns `AppError` if the inventory task fails
#[utoipa::path(
    get,
    path = "/api/v1/hardware/dynamic",
    tag = "Hardware",
    responses(
        (status = 200, description = "Dynamic inventory snapshot", body = serde_json::Value),
        (status = 500, description = "Inventory unavailable", body = ApiError)
    )
)]
pub async fn get_dynamic(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = state
        .with_inventory(|inventory, _| inventory.dynamic_snapshot())
        .await?;
    Ok(Json(snapshot))
}

/// Run a full scan and replace the inventory
///
/// # Errors
/// Returns `AppError` if the scan task fails
#[utoipa::path(
    post,
    path = "/api/v1/hardware/rescan",
    tag = "Hardware",
    responses(
        (status = 200, description = "Record counts of the new inventory", body = RescanResponse),
        (status = 502, description = "Probe tool unavailable; previous inventory kept", body = ApiError),
        (status = 503, description = "Scan cannot run on this host; previous inventory kept", body = ApiError),
        (status = 500, description = "Scan task failed", body = ApiError)
    )
)]
pub async fn rescan(State(state): State<Arc<AppState>>) -> Result<Json<RescanResponse>, AppError> {
    Ok(Json(state.rescan().await?))
}

/// Apply GPU control values to the device addressed by `guid`
///
/// # Errors
/// Returns `AppError` if no record has the GUID or the inventory task fails
#[utoipa::path(
    post,
    path = "/api/v1/hardware/{guid}/overclock",
    tag = "Hardware",
    params(("guid" = String, Path, description = "Device GUID")),
    request_body = OverclockRequest,
    responses(
        (status = 200, description = "Per-field outcome", body = OverclockResponse),
        (status = 404, description = "Unknown GUID", body = ApiError),
        (status = 500, description = "Inventory unavailable", body = ApiError)
    )
)]
pub async fn overclock(
    State(state): State<Arc<AppState>>,
    Path(guid): Path<String>,
    Json(request): Json<OverclockRequest>,
) -> Result<Json<OverclockResponse>, AppError> {
    let guid = Guid::from(guid);
    let response = {
        let guid = guid.clone();
        state
            .with_inventory(move |inventory, scanner| {
                inventory
                    .apply_overclock(scanner.io(), &guid, &request)
                    .into_response(&guid)
            })
            .await?
    };

    if response.status == OverclockStatus::NotFound {
        return Err(AppError::device_not_found(&guid));
    }
    info!(%guid, status = ?response.status, applied = response.applied.len(), "overclock request handled");
    Ok(Json(response))
}
