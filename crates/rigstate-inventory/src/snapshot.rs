//! Serializable views of the inventory
//!
//! The static snapshot carries every record's static fields; the dynamic
//! snapshot carries only the sensor readings, keyed by GUID.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::guid::Guid;
use crate::merge::HardwareRecord;
use crate::system::OsInfo;
use crate::types::{
    CpuParameters, CpuSensors, DriveParameters, DriveSensors, GpuParameters, GpuSensors,
    MotherboardParameters, NetworkAdapter, NetworkSensors, RamCard,
};

#[derive(Debug, Clone, Serialize)]
pub struct StaticSnapshot {
    pub collected_at: Option<DateTime<Utc>>,
    pub os: OsInfo,
    pub cpus: Vec<CpuParameters>,
    pub gpus: Vec<GpuParameters>,
    pub ram: Vec<RamCard>,
    pub drives: Vec<DriveParameters>,
    pub network: Vec<NetworkAdapter>,
    pub motherboard: Option<MotherboardParameters>,
}

/// Sensor readings of one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DynamicEntry<S> {
    pub guid: Option<Guid>,
    #[serde(flatten)]
    pub sensors: S,
}

impl<S: Clone> DynamicEntry<S> {
    pub(crate) fn of<R: HardwareRecord>(record: &R, sensors: &S) -> Self {
        Self {
            guid: record.guid().get().cloned(),
            sensors: sensors.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DynamicSnapshot {
    pub refreshed_at: DateTime<Utc>,
    pub cpus: Vec<DynamicEntry<CpuSensors>>,
    pub gpus: Vec<DynamicEntry<GpuSensors>>,
    pub drives: Vec<DynamicEntry<DriveSensors>>,
    pub network: Vec<DynamicEntry<NetworkSensors>>,
}
