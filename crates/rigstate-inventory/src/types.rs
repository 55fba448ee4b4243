//! Inventory record definitions
//!
//! One record type per hardware domain. Static attributes are serialised
//! with the record; the `sensors` group of each record holds the dynamic
//! readings the telemetry pass overwrites and is projected separately.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::field::Field;
use crate::guid::Guid;
use crate::merge::{HardwareRecord, NodeFields};
use crate::parse::pci::{Modalias, PciSlot};
use crate::parse::usb::UsbDevice;
use crate::vendor::GpuBackend;

// ============================================================================
// Ranges
// ============================================================================

/// Inclusive `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: i64,
    pub max: i64,
}

impl Bounds {
    #[must_use]
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Advertised limits of a tunable or sensor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranged {
    pub min: Field<i64>,
    pub max: Field<i64>,
    pub default: Field<i64>,
}

impl Ranged {
    /// `[min, max]` when both ends are known
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        Some(Bounds {
            min: self.min.copied()?,
            max: self.max.copied()?,
        })
    }

    /// Fill both ends from `bounds` when they are still unknown
    pub fn fill_bounds(&mut self, bounds: Option<Bounds>) {
        if let Some(bounds) = bounds {
            self.min.fill_if_absent(bounds.min);
            self.max.fill_if_absent(bounds.max);
        }
    }
}

// ============================================================================
// CPU
// ============================================================================

/// Cache sizes in KB
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSizes {
    pub l1_kb: Field<u64>,
    pub l2_kb: Field<u64>,
    pub l3_kb: Field<u64>,
}

/// Dynamic CPU readings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSensors {
    /// Package temperature in °C
    pub temperature: Field<i64>,
    /// Average core clock in MHz
    pub clock_mhz: Field<i64>,
}

/// One processor package
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuParameters {
    pub guid: Field<Guid>,
    #[serde(flatten)]
    pub node: NodeFields,
    pub architecture: Field<String>,
    pub op_mode: Field<String>,
    pub cores: Field<u32>,
    pub enabled_cores: Field<u32>,
    pub threads: Field<u32>,
    pub sockets: Field<u32>,
    pub thread_per_core: Field<u32>,
    pub cores_per_socket: Field<u32>,
    pub cache: CacheSizes,
    pub compute_units: Field<u32>,
    /// Clock limits in MHz
    pub clock: Ranged,
    /// Temperature limits in °C
    pub temperature: Ranged,
    /// Power limits in W
    pub power: Ranged,
    #[serde(skip)]
    pub sensors: CpuSensors,
    /// hwmon `temp1_input` of the package sensor
    #[serde(skip)]
    pub temperature_input: Option<PathBuf>,
}

// ============================================================================
// GPU
// ============================================================================

/// GPU vendor family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuVendor {
    Amd,
    Nvidia,
}

impl fmt::Display for GpuVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuVendor::Amd => write!(f, "AMD"),
            GpuVendor::Nvidia => write!(f, "Nvidia"),
        }
    }
}

/// PCI ids from the device's `modalias`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciIds {
    pub vendor: Field<String>,
    pub device: Field<String>,
    pub subvendor: Field<String>,
    pub subdevice: Field<String>,
}

impl From<Modalias> for PciIds {
    fn from(alias: Modalias) -> Self {
        Self {
            vendor: Field::Present(alias.vendor_id),
            device: Field::Present(alias.device_id),
            subvendor: Field::Present(alias.subvendor_id),
            subdevice: Field::Present(alias.subdevice_id),
        }
    }
}

/// Dynamic GPU readings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuSensors {
    /// °C
    pub temperature: Field<i64>,
    /// Percent
    pub fan_speed: Field<i64>,
    /// W
    pub power_draw: Field<i64>,
    /// W
    pub power_limit: Field<i64>,
    /// MHz
    pub core_clock: Field<i64>,
    /// MHz
    pub memory_clock: Field<i64>,
    /// mV
    pub core_voltage: Field<i64>,
    /// mV
    pub memory_voltage: Field<i64>,
    /// MHz
    pub core_clock_offset: Field<i64>,
    /// MHz
    pub memory_clock_offset: Field<i64>,
}

/// One graphics adapter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuParameters {
    pub guid: Field<Guid>,
    #[serde(flatten)]
    pub node: NodeFields,
    pub description: Field<String>,
    pub subvendor: Field<String>,
    /// Bus info as the probe reported it (`pci@0000:0b:00.0`)
    pub pci_info: Field<String>,
    pub vram: Field<u64>,
    pub kind: Field<GpuVendor>,
    /// Position among GPUs of the same vendor; addresses vendor tools
    pub actual_id: Field<u32>,
    pub compute_units: Field<u32>,
    pub driver_version: Field<String>,
    /// Vendor backend in use (`amdgpu-sysfs`, `nvidia-smi`)
    pub info_provider: Field<String>,
    pub pci_ids: PciIds,
    /// W
    pub power_limit: Ranged,
    /// Percent
    pub fan: Ranged,
    /// °C
    pub temperature: Ranged,
    /// MHz
    pub core_clock: Ranged,
    /// MHz
    pub memory_clock: Ranged,
    /// mV
    pub core_voltage: Ranged,
    /// mV
    pub memory_voltage: Ranged,
    /// MHz
    pub core_clock_offset: Ranged,
    /// MHz
    pub memory_clock_offset: Ranged,
    #[serde(skip)]
    pub sensors: GpuSensors,
    #[serde(skip)]
    pub backend: Option<GpuBackend>,
}

// ============================================================================
// RAM
// ============================================================================

/// One populated memory module
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RamCard {
    pub guid: Field<Guid>,
    #[serde(flatten)]
    pub node: NodeFields,
    pub total_mb: Field<u64>,
    /// MHz
    pub configured_speed: Field<u64>,
    /// MHz
    pub speed: Field<u64>,
    pub width: Field<u64>,
    #[serde(rename = "type")]
    pub kind: Field<String>,
}

// ============================================================================
// Drives
// ============================================================================

/// Dynamic drive readings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveSensors {
    /// °C
    pub temperature: Field<i64>,
    pub free_mb: Field<f64>,
    pub used_mb: Field<f64>,
}

/// One block device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriveParameters {
    pub guid: Field<Guid>,
    #[serde(flatten)]
    pub node: NodeFields,
    pub description: Field<String>,
    pub sector_size: Field<u64>,
    /// Capacity in MB
    pub total_mb: Field<f64>,
    #[serde(skip)]
    pub sensors: DriveSensors,
}

// ============================================================================
// Network
// ============================================================================

/// Dynamic interface readings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSensors {
    pub ip_address: Field<String>,
    pub link_up: Field<bool>,
    /// Mb/s
    pub link_speed: Field<i64>,
}

/// One network interface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAdapter {
    pub guid: Field<Guid>,
    #[serde(flatten)]
    pub node: NodeFields,
    pub description: Field<String>,
    /// Negotiated speed as the probe printed it (`1Gbit/s`)
    pub speed: Field<String>,
    /// bit/s
    pub capacity: Field<u64>,
    #[serde(skip)]
    pub sensors: NetworkSensors,
}

// ============================================================================
// Motherboard
// ============================================================================

/// The board and its firmware
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotherboardParameters {
    pub guid: Field<Guid>,
    #[serde(flatten)]
    pub node: NodeFields,
    pub description: Field<String>,
    pub boot_type: Field<String>,
    pub family: Field<String>,
    pub bios_version: Field<String>,
    pub memory_slots: Field<u32>,
    pub pci_slots: Vec<PciSlot>,
    pub usb_devices: Vec<UsbDevice>,
}

// ============================================================================
// Record plumbing
// ============================================================================

macro_rules! hardware_record {
    ($ty:ty, |$r:ident| $parts:expr) => {
        impl HardwareRecord for $ty {
            fn node_fields(&self) -> &NodeFields {
                &self.node
            }

            fn node_fields_mut(&mut self) -> &mut NodeFields {
                &mut self.node
            }

            fn guid(&self) -> &Field<Guid> {
                &self.guid
            }

            fn guid_mut(&mut self) -> &mut Field<Guid> {
                &mut self.guid
            }

            fn identity_parts(&self) -> Vec<String> {
                let $r = self;
                $parts.iter().map(|s| s.to_string()).collect()
            }
        }
    };
}

hardware_record!(CpuParameters, |r| [
    r.node.product.as_str(),
    r.node.vendor.as_str(),
    r.node.serial.as_str(),
    r.architecture.as_str(),
]);

hardware_record!(GpuParameters, |r| [
    r.node.vendor.as_str(),
    r.node.product.as_str(),
    r.subvendor.as_str(),
    r.node.serial.as_str(),
    r.pci_info.as_str(),
]);

hardware_record!(RamCard, |r| [r.node.product.as_str(), r.node.serial.as_str()]);

hardware_record!(DriveParameters, |r| [
    r.node.product.as_str(),
    r.node.serial.as_str()
]);

hardware_record!(MotherboardParameters, |r| [
    r.node.serial.as_str(),
    r.node.vendor.as_str(),
    r.node.product.as_str(),
]);

impl HardwareRecord for NetworkAdapter {
    fn node_fields(&self) -> &NodeFields {
        &self.node
    }

    fn node_fields_mut(&mut self) -> &mut NodeFields {
        &mut self.node
    }

    fn guid(&self) -> &Field<Guid> {
        &self.guid
    }

    fn guid_mut(&mut self) -> &mut Field<Guid> {
        &mut self.guid
    }

    /// The interface name, or serial+vendor+product for unnamed interfaces
    fn identity_parts(&self) -> Vec<String> {
        match self.node.logical_name.non_blank() {
            Some(name) => vec![name.to_string()],
            None => vec![
                self.node.serial.as_str().to_string(),
                self.node.vendor.as_str().to_string(),
                self.node.product.as_str().to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranged_bounds() {
        let mut fan = Ranged::default();
        assert_eq!(fan.bounds(), None);

        fan.fill_bounds(Some(Bounds { min: 0, max: 100 }));
        fan.fill_bounds(Some(Bounds { min: 20, max: 80 }));
        assert_eq!(fan.bounds(), Some(Bounds { min: 0, max: 100 }));
        assert!(fan.bounds().unwrap().contains(100));
        assert!(!fan.bounds().unwrap().contains(101));
    }

    #[test]
    fn test_network_identity_falls_back() {
        let mut nic = NetworkAdapter::default();
        nic.node.serial.set("a8:a1:59:00:00:01".into());
        assert_eq!(nic.identity_parts().len(), 3);

        nic.node.logical_name.set("enp5s0".into());
        assert_eq!(nic.identity_parts(), vec!["enp5s0".to_string()]);
    }

    #[test]
    fn test_static_serialization_skips_sensors() {
        let mut drive = DriveParameters::default();
        drive.node.serial.set("ABC123".into());
        drive.sensors.temperature.set(40);

        let json = serde_json::to_value(&drive).unwrap();
        assert_eq!(json["serial"], "ABC123");
        assert!(json.get("sensors").is_none());
        assert!(json["guid"].is_null());
    }
}
