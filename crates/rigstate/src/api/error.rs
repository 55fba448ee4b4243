//! API error types
//!
//! Every failure reaches clients as an [`ApiError`] body with one of the
//! codes below and a matching status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rigstate_inventory::{Guid, InventoryError};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// No record carries the requested GUID
pub const DEVICE_NOT_FOUND: &str = "DEVICE_NOT_FOUND";
/// The scan cannot succeed on this host as configured (privilege, probe output)
pub const SCAN_ABORTED: &str = "SCAN_ABORTED";
/// A probe tool was missing, timed out or failed; a retry may succeed
pub const PROBE_UNAVAILABLE: &str = "PROBE_UNAVAILABLE";
/// The blocking inventory task panicked or was cancelled
pub const INVENTORY_TASK_FAILED: &str = "INVENTORY_TASK_FAILED";

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code
    pub code: String,
    /// Error message
    pub message: String,
}

impl ApiError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// [`ApiError`] with the status it is sent under
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: ApiError,
}

impl AppError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            error: ApiError::new(code, message),
        }
    }

    pub fn task_failed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INVENTORY_TASK_FAILED, message)
    }

    pub fn device_not_found(guid: &Guid) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            DEVICE_NOT_FOUND,
            format!("no device with guid {guid}"),
        )
    }
}

/// Scan failures; the previous inventory stays in place
impl From<InventoryError> for AppError {
    fn from(e: InventoryError) -> Self {
        if e.aborts_scan() {
            Self::new(StatusCode::SERVICE_UNAVAILABLE, SCAN_ABORTED, e.to_string())
        } else {
            Self::new(StatusCode::BAD_GATEWAY, PROBE_UNAVAILABLE, e.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_errors_map_to_codes() {
        let err = AppError::from(InventoryError::PrivilegeFailure("not root".into()));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error.code, SCAN_ABORTED);

        let err = AppError::from(InventoryError::CollaboratorUnavailable("lshw".into()));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.error.code, PROBE_UNAVAILABLE);
    }

    #[test]
    fn test_device_not_found() {
        let err = AppError::device_not_found(&Guid::from("abc"));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.error.code, DEVICE_NOT_FOUND);
        assert_eq!(err.error.message, "no device with guid abc");
    }
}
