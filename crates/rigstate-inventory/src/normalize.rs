//! String normalisation shared by the extractors

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

static ANNOTATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]+\]").expect("annotation pattern is valid"));

static NVME_CONTROLLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^nvme[0-9]+").expect("nvme pattern is valid"));

static LETTERED_DISK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:sd|hd|vd|xvd)[a-z]+").expect("disk pattern is valid"));

static PARTITION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9])p[0-9]+$").expect("partition pattern is valid"));

const BOARD_PLACEHOLDER: &str = "(Default string)";

/// Cut a string at its first `[...]` annotation and trim
///
/// `"Advanced Micro Devices, Inc. [AMD/ATI]"` becomes
/// `"Advanced Micro Devices, Inc."`. Anything after the annotation goes too.
#[must_use]
pub fn strip_annotation(value: &str) -> String {
    match ANNOTATION.find(value) {
        Some(m) => value[..m.start()].trim().to_string(),
        None => value.trim().to_string(),
    }
}

/// Characters `start..start + len`, clamped to the string
#[must_use]
pub fn char_slice(value: &str, start: usize, len: usize) -> String {
    value.chars().skip(start).take(len).collect()
}

/// Two-character bus number out of a long bus-info string
///
/// `"pci@0000:0b:00.0"` becomes `"0b"`. Strings of 10 characters or fewer
/// are returned as-is. Assumes the `pci@DDDD:` prefix layout.
#[must_use]
pub fn trim_bus_info(value: &str) -> String {
    if value.chars().count() > 10 {
        char_slice(value, 9, 2)
    } else {
        value.to_string()
    }
}

/// Drop the firmware's `(Default string)` placeholder
#[must_use]
pub fn strip_placeholder(value: &str) -> String {
    value.replace(BOARD_PLACEHOLDER, "").trim().to_string()
}

/// Base block device for a logical name
///
/// `/dev/nvme0n1p2` becomes `nvme0` and `/dev/sdb3` becomes `sdb`. Other
/// names only lose a `pN` partition suffix that follows a digit
/// (`mmcblk0p1` becomes `mmcblk0`), so `md127` and `loop10` stay whole.
/// Already-normalised names come back unchanged.
#[must_use]
pub fn base_device_name(logical_name: &str) -> String {
    let name = logical_name.trim();
    let name = name.strip_prefix("/dev/").unwrap_or(name);

    if let Some(m) = NVME_CONTROLLER.find(name) {
        return m.as_str().to_string();
    }
    if let Some(m) = LETTERED_DISK.find(name) {
        return m.as_str().to_string();
    }
    PARTITION_SUFFIX.replace(name, "$1").into_owned()
}

// ============================================================================
// Vendor names
// ============================================================================

/// Vendor string normalisation tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorMap {
    /// Legal entity names replaced by short brand names, applied in order
    brands: Vec<(String, String)>,
    /// PCI vendor id (lowercase hex) to name
    pci: BTreeMap<String, String>,
    /// Vendors that mark bus controllers rather than drives
    bus_vendors: Vec<String>,
}

impl Default for VendorMap {
    fn default() -> Self {
        let brands = [
            ("Advanced Micro Devices, Inc.", "AMD"),
            ("Advanced Micro Devices", "AMD"),
            ("Intel Corporation", "Intel"),
            ("Intel Corp.", "Intel"),
            ("NVIDIA Corporation", "NVIDIA"),
        ];
        let pci = [
            ("1002", "AMD"),
            ("1022", "AMD"),
            ("10de", "NVIDIA"),
            ("8086", "Intel"),
            ("1043", "ASUSTeK"),
            ("1462", "MSI"),
            ("148c", "PowerColor"),
            ("1da2", "Sapphire"),
            ("1458", "Gigabyte"),
            ("3842", "EVGA"),
            ("1682", "XFX"),
            ("19da", "Zotac"),
            ("1849", "ASRock"),
            ("1028", "Dell"),
            ("103c", "HP"),
            ("17aa", "Lenovo"),
        ];
        Self {
            brands: brands
                .iter()
                .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
                .collect(),
            pci: pci
                .iter()
                .map(|(id, name)| ((*id).to_string(), (*name).to_string()))
                .collect(),
            bus_vendors: vec!["AMD".into(), "Intel".into()],
        }
    }
}

impl VendorMap {
    /// Replace legal entity names by brand names
    #[must_use]
    pub fn normalize(&self, vendor: &str) -> String {
        let mut out = vendor.to_string();
        for (from, to) in &self.brands {
            if out.contains(from.as_str()) {
                out = out.replace(from.as_str(), to);
            }
        }
        out.trim().to_string()
    }

    /// Normalise, then cut any `[...]` annotation
    #[must_use]
    pub fn clean(&self, vendor: &str) -> String {
        strip_annotation(&self.normalize(vendor))
    }

    /// Vendor name for a PCI vendor id such as `"1da2"` or `"00001DA2"`
    #[must_use]
    pub fn pci_vendor(&self, id: &str) -> Option<&str> {
        let id = id.trim().to_ascii_lowercase();
        let id = if id.len() > 4 { &id[id.len() - 4..] } else { id.as_str() };
        self.pci.get(id).map(String::as_str)
    }

    /// `true` when `vendor` names a chipset/bus vendor
    #[must_use]
    pub fn is_bus_vendor(&self, vendor: &str) -> bool {
        self.bus_vendors.iter().any(|v| v == vendor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_annotation() {
        assert_eq!(
            strip_annotation("Advanced Micro Devices, Inc. [AMD/ATI]"),
            "Advanced Micro Devices, Inc."
        );
        assert_eq!(
            strip_annotation("Navi 22 [Radeon RX 6700 XT] rev c1"),
            "Navi 22"
        );
        assert_eq!(strip_annotation("  Samsung  "), "Samsung");
        assert_eq!(strip_annotation("empty [] brackets"), "empty [] brackets");
    }

    #[test]
    fn test_trim_bus_info() {
        assert_eq!(trim_bus_info("pci@0000:0b:00.0"), "0b");
        assert_eq!(trim_bus_info("cpu@0"), "cpu@0");
        assert_eq!(trim_bus_info("0123456789"), "0123456789");
    }

    #[test]
    fn test_base_device_name() {
        assert_eq!(base_device_name("/dev/nvme0n1"), "nvme0");
        assert_eq!(base_device_name("/dev/nvme1n1p3"), "nvme1");
        assert_eq!(base_device_name("/dev/sdb3"), "sdb");
        assert_eq!(base_device_name("sda"), "sda");
        assert_eq!(base_device_name("/dev/vda2"), "vda");
        assert_eq!(base_device_name("/dev/mmcblk0p1"), "mmcblk0");
        assert_eq!(base_device_name("/dev/mmcblk10"), "mmcblk10");
        assert_eq!(base_device_name("/dev/md127"), "md127");
        assert_eq!(base_device_name("/dev/loop10"), "loop10");
    }

    #[test]
    fn test_base_device_name_is_idempotent() {
        for raw in ["/dev/nvme0n1p2", "/dev/sdb3", "/dev/mmcblk0p1", "/dev/md127"] {
            let once = base_device_name(raw);
            assert_eq!(base_device_name(&once), once, "{raw}");
        }
    }

    #[test]
    fn test_strip_placeholder() {
        assert_eq!(strip_placeholder("MS-7C56 (Default string)"), "MS-7C56");
    }

    #[test]
    fn test_vendor_map() {
        let vendors = VendorMap::default();
        assert_eq!(vendors.clean("Advanced Micro Devices, Inc. [AMD/ATI]"), "AMD");
        assert_eq!(vendors.normalize("Intel Corporation"), "Intel");
        assert_eq!(vendors.pci_vendor("00001DA2"), Some("Sapphire"));
        assert_eq!(vendors.pci_vendor("ffff"), None);
        assert!(vendors.is_bus_vendor("AMD"));
        assert!(!vendors.is_bus_vendor("Samsung"));
    }
}
