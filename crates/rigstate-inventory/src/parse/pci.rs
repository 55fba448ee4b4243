//! PCI scrapers: `lspci`, drm consumer links and `modalias`

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::InventoryError;

static MODALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^pci:v([0-9a-f]{8})d([0-9a-f]{8})sv([0-9a-f]{8})sd([0-9a-f]{8})bc([0-9a-f]{2})sc([0-9a-f]{2})i([0-9a-f]{2})",
    )
    .expect("modalias pattern is valid")
});

const DRM_CONSUMER_PREFIX: &str = "consumer:pci:0000:";

/// Kind of a PCI function, from the `lspci` class text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PciSlotKind {
    HostBridge,
    PciBridge,
    Iommu,
    Usb,
    Ethernet,
    VgaCompatible,
    Sata,
    Other,
}

impl PciSlotKind {
    fn from_class(class: &str) -> Self {
        match class.trim() {
            "Host bridge" => PciSlotKind::HostBridge,
            "PCI bridge" => PciSlotKind::PciBridge,
            "IOMMU" => PciSlotKind::Iommu,
            "USB controller" => PciSlotKind::Usb,
            "Ethernet controller" => PciSlotKind::Ethernet,
            "VGA compatible controller" => PciSlotKind::VgaCompatible,
            "SATA controller" => PciSlotKind::Sata,
            _ => PciSlotKind::Other,
        }
    }
}

/// One `lspci` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PciSlot {
    /// `BB:DD.F`
    pub bus: String,
    pub kind: PciSlotKind,
    pub description: String,
    /// `false` for bridges, which only route to other slots
    pub is_installed: bool,
}

/// Parse plain `lspci` output
///
/// # Errors
///
/// Returns a parse failure for a line without a `BB:DD.F Class: text` shape.
pub fn parse_lspci(text: &str) -> Result<Vec<PciSlot>, InventoryError> {
    let mut slots = Vec::new();

    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        let (bus, rest) = line
            .split_once(' ')
            .ok_or_else(|| InventoryError::parse("lspci", format!("no bus address: {line}")))?;
        let (class, description) = rest
            .split_once(": ")
            .ok_or_else(|| InventoryError::parse("lspci", format!("no device class: {line}")))?;

        let kind = PciSlotKind::from_class(class);
        slots.push(PciSlot {
            bus: bus.to_string(),
            kind,
            description: description.trim().to_string(),
            is_installed: kind != PciSlotKind::PciBridge,
        });
    }

    Ok(slots)
}

/// PCI bus number from a drm `consumer:pci:0000:BB:DD.F` link name
#[must_use]
pub fn parse_drm_consumer(entry: &str) -> Option<u32> {
    let rest = entry.strip_prefix(DRM_CONSUMER_PREFIX)?;
    u32::from_str_radix(rest.get(..2)?, 16).ok()
}

/// Identifiers encoded in a PCI `modalias` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modalias {
    pub vendor_id: String,
    pub device_id: String,
    pub subvendor_id: String,
    pub subdevice_id: String,
    pub class: String,
    pub subclass: String,
    pub interface: String,
}

/// Parse `pci:v0000XXXXd0000XXXXsv...sd...bc..sc..i..`
///
/// Ids are reduced to their last four hex digits, lowercase.
///
/// # Errors
///
/// Returns a parse failure for non-PCI or truncated aliases.
pub fn parse_modalias(text: &str) -> Result<Modalias, InventoryError> {
    let caps = MODALIAS
        .captures(text.trim())
        .ok_or_else(|| InventoryError::parse("modalias", format!("unexpected alias {:?}", text.trim())))?;

    let id = |i: usize| {
        let hex = caps[i].to_ascii_lowercase();
        hex[hex.len().saturating_sub(4)..].to_string()
    };
    let byte = |i: usize| caps[i].to_ascii_lowercase();

    Ok(Modalias {
        vendor_id: id(1),
        device_id: id(2),
        subvendor_id: id(3),
        subdevice_id: id(4),
        class: byte(5),
        subclass: byte(6),
        interface: byte(7),
    })
}
