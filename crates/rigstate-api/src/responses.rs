//! Response types for the API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Record counts of a fresh scan
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RescanResponse {
    pub collected_at: DateTime<Utc>,
    pub cpus: usize,
    pub gpus: usize,
    pub ram: usize,
    pub drives: usize,
    pub network: usize,
    pub motherboard: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum OverclockStatus {
    /// Every requested field was applied
    Success,
    /// No record has the requested GUID
    NotFound,
    /// At least one field was rejected or failed
    PartiallyApplied,
}

/// One request field that was not applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RejectedField {
    /// Request field name, e.g. `coreClockOffset`
    pub field: String,
    pub value: i64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OverclockResponse {
    pub guid: String,
    pub status: OverclockStatus,
    /// Request field names that were applied, in application order
    pub applied: Vec<String>,
    pub rejected: Vec<RejectedField>,
}
