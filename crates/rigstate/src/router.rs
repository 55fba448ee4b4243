//! HTTP router configuration

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use utoipa::OpenApi;

use crate::api::{hardware, system};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(title = "rigstate", description = "Hardware inventory and GPU control"),
    paths(
        system::health,
        system::system_status,
        hardware::get_hardware,
        hardware::get_dynamic,
        hardware::rescan,
        hardware::overclock,
    ),
    components(schemas(
        rigstate_api::HealthResponse,
        rigstate_api::RescanResponse,
        rigstate_api::OverclockRequest,
        rigstate_api::OverclockResponse,
        rigstate_api::OverclockStatus,
        rigstate_api::RejectedField,
        crate::api::ApiError,
    ))
)]
pub struct ApiDoc;

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // System endpoints
        .route("/health", get(system::health))
        .route("/openapi.json", get(openapi))
        .route("/api/v1/system", get(system::system_status))
        // Hardware
        .route("/api/v1/hardware", get(hardware::get_hardware))
        .route("/api/v1/hardware/dynamic", get(hardware::get_dynamic))
        .route("/api/v1/hardware/rescan", post(hardware::rescan))
        .route("/api/v1/hardware/{guid}/overclock", post(hardware::overclock))
        // State
        .with_state(state)
}
