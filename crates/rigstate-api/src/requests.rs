//! Request types for the API

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// GPU control request; every field is optional and validated on its own
///
/// Clock offsets are in MHz, voltages in mV, power in W and fan speed in
/// percent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverclockRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_speed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_clock_offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_clock_offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_voltage: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_voltage: Option<i64>,
}

impl OverclockRequest {
    /// `true` when no field is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.power_limit.is_none()
            && self.fan_speed.is_none()
            && self.core_clock_offset.is_none()
            && self.mem_clock_offset.is_none()
            && self.core_voltage.is_none()
            && self.mem_voltage.is_none()
    }
}
