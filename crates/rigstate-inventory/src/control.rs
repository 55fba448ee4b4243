//! GPU control plane
//!
//! A request is split into per-knob values, applied in a fixed order. Each
//! value is checked against the device's advertised range on its own: a
//! rejected value never blocks the others.

use std::fmt;

use rigstate_api::{OverclockRequest, OverclockResponse, OverclockStatus, RejectedField};
use tracing::{info, warn};

use crate::collab::Collaborators;
use crate::error::InventoryError;
use crate::guid::Guid;
use crate::types::{Bounds, GpuParameters, GpuVendor};
use crate::vendor::GpuMetric;

/// One settable GPU parameter, in application order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Knob {
    FanSpeed,
    CoreClockOffset,
    CoreVoltage,
    MemClockOffset,
    MemVoltage,
    PowerLimit,
}

impl Knob {
    /// Every knob, in the order they are applied
    pub const ORDER: [Knob; 6] = [
        Knob::FanSpeed,
        Knob::CoreClockOffset,
        Knob::CoreVoltage,
        Knob::MemClockOffset,
        Knob::MemVoltage,
        Knob::PowerLimit,
    ];

    /// Request field name
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Knob::FanSpeed => "fanSpeed",
            Knob::CoreClockOffset => "coreClockOffset",
            Knob::CoreVoltage => "coreVoltage",
            Knob::MemClockOffset => "memClockOffset",
            Knob::MemVoltage => "memVoltage",
            Knob::PowerLimit => "powerLimit",
        }
    }

    /// Value of this knob in `request`
    #[must_use]
    pub fn requested(self, request: &OverclockRequest) -> Option<i64> {
        match self {
            Knob::FanSpeed => request.fan_speed,
            Knob::CoreClockOffset => request.core_clock_offset,
            Knob::CoreVoltage => request.core_voltage,
            Knob::MemClockOffset => request.mem_clock_offset,
            Knob::MemVoltage => request.mem_voltage,
            Knob::PowerLimit => request.power_limit,
        }
    }

    /// The dynamic metric that reflects this knob after a write
    fn metric(self, vendor: Option<GpuVendor>) -> GpuMetric {
        let amd = vendor == Some(GpuVendor::Amd);
        match self {
            Knob::FanSpeed => GpuMetric::FanSpeed,
            Knob::CoreClockOffset if amd => GpuMetric::CoreClock,
            Knob::CoreClockOffset => GpuMetric::CoreClockOffset,
            Knob::MemClockOffset if amd => GpuMetric::MemoryClock,
            Knob::MemClockOffset => GpuMetric::MemoryClockOffset,
            Knob::CoreVoltage => GpuMetric::CoreVoltage,
            Knob::MemVoltage => GpuMetric::MemoryVoltage,
            Knob::PowerLimit => GpuMetric::PowerLimit,
        }
    }
}

impl fmt::Display for Knob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a knob value was not applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    OutOfRange { min: i64, max: i64 },
    /// The device never advertised a range for this knob
    UnknownBounds,
    Unsupported,
    SetterFailed(String),
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::OutOfRange { min, max } => write!(f, "outside [{min}, {max}]"),
            RejectionReason::UnknownBounds => f.write_str("device range unknown"),
            RejectionReason::Unsupported => f.write_str("not supported by this device"),
            RejectionReason::SetterFailed(e) => write!(f, "write failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRejection {
    pub knob: Knob,
    pub value: i64,
    pub reason: RejectionReason,
}

/// Result of one control request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverclockOutcome {
    Success { applied: Vec<Knob> },
    NotFound,
    PartiallyApplied {
        applied: Vec<Knob>,
        rejected: Vec<FieldRejection>,
    },
}

impl OverclockOutcome {
    #[must_use]
    pub fn status(&self) -> OverclockStatus {
        match self {
            OverclockOutcome::Success { .. } => OverclockStatus::Success,
            OverclockOutcome::NotFound => OverclockStatus::NotFound,
            OverclockOutcome::PartiallyApplied { .. } => OverclockStatus::PartiallyApplied,
        }
    }

    /// Response body for the record `guid`
    #[must_use]
    pub fn into_response(self, guid: &Guid) -> OverclockResponse {
        let status = self.status();
        let (applied, rejected) = match self {
            OverclockOutcome::Success { applied } => (applied, Vec::new()),
            OverclockOutcome::NotFound => (Vec::new(), Vec::new()),
            OverclockOutcome::PartiallyApplied { applied, rejected } => (applied, rejected),
        };
        OverclockResponse {
            guid: guid.to_string(),
            status,
            applied: applied.iter().map(|k| k.name().to_string()).collect(),
            rejected: rejected
                .into_iter()
                .map(|r| RejectedField {
                    field: r.knob.name().to_string(),
                    value: r.value,
                    reason: r.reason.to_string(),
                })
                .collect(),
        }
    }
}

/// Advertised range of `knob` on `gpu`
///
/// AMD has no clock offsets; its "offset" knobs set the top DPM clock and are
/// bounded by the clock range.
#[must_use]
pub fn knob_bounds(gpu: &GpuParameters, knob: Knob) -> Option<Bounds> {
    let amd = gpu.kind.copied() == Some(GpuVendor::Amd);
    match knob {
        Knob::FanSpeed => gpu.fan.bounds(),
        Knob::PowerLimit => gpu.power_limit.bounds(),
        Knob::CoreClockOffset if amd => gpu.core_clock.bounds(),
        Knob::CoreClockOffset => gpu.core_clock_offset.bounds(),
        Knob::MemClockOffset if amd => gpu.memory_clock.bounds(),
        Knob::MemClockOffset => gpu.memory_clock_offset.bounds(),
        Knob::CoreVoltage => gpu.core_voltage.bounds(),
        Knob::MemVoltage => gpu.memory_voltage.bounds(),
    }
}

/// Check `value` against the advertised range
///
/// # Errors
///
/// Returns [`InventoryError::ValidationFailure`] outside the range, and
/// [`InventoryError::Unsupported`] when no range is known.
pub fn validate(gpu: &GpuParameters, knob: Knob, value: i64) -> Result<(), InventoryError> {
    let Some(bounds) = knob_bounds(gpu, knob) else {
        return Err(InventoryError::Unsupported(format!("{knob}: device range unknown")));
    };
    if bounds.contains(value) {
        Ok(())
    } else {
        Err(InventoryError::ValidationFailure {
            knob: knob.to_string(),
            value,
            min: bounds.min,
            max: bounds.max,
        })
    }
}

/// Apply every set field of `request` to `gpu`
///
/// Successful writes update the matching sensor reading; a fan write also
/// becomes the fan default.
pub fn apply_to_gpu(
    gpu: &mut GpuParameters,
    request: &OverclockRequest,
    io: &Collaborators,
) -> OverclockOutcome {
    let mut applied = Vec::new();
    let mut rejected = Vec::new();

    for knob in Knob::ORDER {
        let Some(value) = knob.requested(request) else {
            continue;
        };
        let reject = |reason| FieldRejection { knob, value, reason };

        let Some(backend) = gpu.backend.as_ref() else {
            rejected.push(reject(RejectionReason::Unsupported));
            continue;
        };
        if !backend.supports(knob) {
            rejected.push(reject(RejectionReason::Unsupported));
            continue;
        }
        let Some(bounds) = knob_bounds(gpu, knob) else {
            rejected.push(reject(RejectionReason::UnknownBounds));
            continue;
        };
        if !bounds.contains(value) {
            warn!(%knob, value, min = bounds.min, max = bounds.max, "control value out of range");
            rejected.push(reject(RejectionReason::OutOfRange {
                min: bounds.min,
                max: bounds.max,
            }));
            continue;
        }

        match backend.apply(io, knob, value) {
            Ok(()) => {
                info!(%knob, value, provider = backend.provider(), "control value applied");
                let metric = knob.metric(gpu.kind.copied());
                let reading = backend.read(io, metric).unwrap_or(value);
                sensor_mut(gpu, metric).set(reading);
                if knob == Knob::FanSpeed {
                    gpu.fan.default.set(value);
                }
                applied.push(knob);
            }
            Err(e) => {
                warn!(%knob, value, error = %e, "control write failed");
                let reason = match e {
                    InventoryError::Unsupported(_) => RejectionReason::Unsupported,
                    other => RejectionReason::SetterFailed(other.to_string()),
                };
                rejected.push(reject(reason));
            }
        }
    }

    if rejected.is_empty() {
        OverclockOutcome::Success { applied }
    } else {
        OverclockOutcome::PartiallyApplied { applied, rejected }
    }
}

/// Reject every set field of `request`; used for records that are not GPUs
#[must_use]
pub fn reject_all(request: &OverclockRequest) -> OverclockOutcome {
    let rejected: Vec<FieldRejection> = Knob::ORDER
        .into_iter()
        .filter_map(|knob| {
            knob.requested(request).map(|value| FieldRejection {
                knob,
                value,
                reason: RejectionReason::Unsupported,
            })
        })
        .collect();

    if rejected.is_empty() {
        OverclockOutcome::Success {
            applied: Vec::new(),
        }
    } else {
        OverclockOutcome::PartiallyApplied {
            applied: Vec::new(),
            rejected,
        }
    }
}

fn sensor_mut(gpu: &mut GpuParameters, metric: GpuMetric) -> &mut crate::field::Field<i64> {
    let sensors = &mut gpu.sensors;
    match metric {
        GpuMetric::Temperature => &mut sensors.temperature,
        GpuMetric::FanSpeed => &mut sensors.fan_speed,
        GpuMetric::PowerDraw => &mut sensors.power_draw,
        GpuMetric::PowerLimit => &mut sensors.power_limit,
        GpuMetric::CoreClock => &mut sensors.core_clock,
        GpuMetric::MemoryClock => &mut sensors.memory_clock,
        GpuMetric::CoreVoltage => &mut sensors.core_voltage,
        GpuMetric::MemoryVoltage => &mut sensors.memory_voltage,
        GpuMetric::CoreClockOffset => &mut sensors.core_clock_offset,
        GpuMetric::MemoryClockOffset => &mut sensors.memory_clock_offset,
    }
}
