//! Compute device enumeration from `clinfo --raw`

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static RAW_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^#\]]+)#(\d+)/(\d+|\*)\]\s+(CL_\w+)\s+(.*)$").expect("clinfo pattern is valid")
});

/// Kind of a compute device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeKind {
    Cpu,
    Gpu,
    #[default]
    Other,
}

/// One compute device as the runtime reports it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeDevice {
    pub platform: usize,
    pub name: String,
    pub kind: ComputeKind,
    pub vendor: String,
    pub compute_units: Option<u32>,
    pub driver_version: String,
}

/// Parse `clinfo --raw`, keeping devices in platform/device order
///
/// Platform-wide (`*`) lines are ignored.
#[must_use]
pub fn parse_clinfo_raw(text: &str) -> Vec<ComputeDevice> {
    let mut devices: Vec<((usize, usize), ComputeDevice)> = Vec::new();

    for caps in text.lines().filter_map(|line| RAW_LINE.captures(line.trim_end())) {
        let (Ok(platform), Ok(index)) = (caps[2].parse::<usize>(), caps[3].parse::<usize>()) else {
            continue;
        };
        let key = (platform, index);
        let position = match devices.iter().position(|(k, _)| *k == key) {
            Some(position) => position,
            None => {
                devices.push((
                    key,
                    ComputeDevice {
                        platform,
                        ..ComputeDevice::default()
                    },
                ));
                devices.len() - 1
            }
        };
        let device = &mut devices[position].1;
        let value = caps[5].trim();

        match &caps[4] {
            "CL_DEVICE_NAME" => device.name = value.to_string(),
            "CL_DEVICE_VENDOR" => device.vendor = value.to_string(),
            "CL_DRIVER_VERSION" => device.driver_version = value.to_string(),
            "CL_DEVICE_MAX_COMPUTE_UNITS" => device.compute_units = value.parse().ok(),
            "CL_DEVICE_TYPE" => {
                device.kind = if value.contains("GPU") {
                    ComputeKind::Gpu
                } else if value.contains("CPU") {
                    ComputeKind::Cpu
                } else {
                    ComputeKind::Other
                };
            }
            _ => {}
        }
    }

    devices.sort_by_key(|(key, _)| *key);
    devices.into_iter().map(|(_, device)| device).collect()
}
