//! Scan context
//!
//! Everything the extractors share: the probe tree and the cross-domain
//! lookup tables. Built once, before any extractor runs, and passed by
//! reference.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::collab::Collaborators;
use crate::normalize::VendorMap;
use crate::parse::clinfo::{ComputeDevice, ComputeKind, parse_clinfo_raw};
use crate::parse::pci::parse_drm_consumer;
use crate::quirks::QuirkTable;
use crate::tree::DeviceNode;

const DRM_ROOT: &str = "/sys/class/drm";
const HWMON_ROOT: &str = "/sys/class/hwmon";
const CPU_SENSORS: &[&str] = &["k10temp", "coretemp", "zenpower", "cpu_thermal"];

/// drm card index to PCI bus number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PciSlotTable {
    entries: Vec<(u32, u32)>,
}

impl PciSlotTable {
    /// Table from `(card, bus)` pairs
    #[must_use]
    pub fn from_pairs(entries: Vec<(u32, u32)>) -> Self {
        Self { entries }
    }

    /// Read `/sys/class/drm/cardN/device/consumer:pci:0000:BB:...` links
    #[must_use]
    pub fn discover(io: &Collaborators) -> Self {
        let root = Path::new(DRM_ROOT);
        let mut entries = Vec::new();

        for card in io.list(root) {
            let Some(index) = card
                .strip_prefix("card")
                .and_then(|n| n.parse::<u32>().ok())
            else {
                continue;
            };
            let device = root.join(&card).join("device");
            if let Some(bus) = io.list(&device).iter().find_map(|e| parse_drm_consumer(e)) {
                debug!(card = index, bus, "drm card mapped to pci bus");
                entries.push((index, bus));
            }
        }

        Self { entries }
    }

    /// drm card index of the device on `bus`
    #[must_use]
    pub fn slot_for_bus(&self, bus: u32) -> Option<u32> {
        self.entries
            .iter()
            .find(|(_, b)| *b == bus)
            .map(|(card, _)| *card)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared, read-only input of one scan
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    tree: DeviceNode,
    vendors: VendorMap,
    pci_slots: PciSlotTable,
    compute: Vec<ComputeDevice>,
    quirks: QuirkTable,
    cpu_sensor: Option<PathBuf>,
}

impl ScanContext {
    /// Context over a tree with default tables and no host lookups
    #[must_use]
    pub fn new(tree: DeviceNode) -> Self {
        Self {
            tree,
            ..Self::default()
        }
    }

    /// Context over a tree with every lookup table read from the host
    ///
    /// Each table is optional: a failing source leaves it empty.
    #[instrument(skip_all)]
    pub fn discover(tree: DeviceNode, io: &Collaborators, quirks: QuirkTable) -> Self {
        let pci_slots = PciSlotTable::discover(io);
        if pci_slots.is_empty() {
            warn!("no drm cards mapped to pci buses");
        }

        let compute = io
            .run("clinfo", &["--raw"])
            .map(|text| parse_clinfo_raw(&text))
            .unwrap_or_default();

        let cpu_sensor = find_cpu_sensor(io);

        info!(
            drm_cards = pci_slots.entries.len(),
            compute_devices = compute.len(),
            cpu_sensor = cpu_sensor.is_some(),
            "scan context ready"
        );

        Self {
            tree,
            vendors: VendorMap::default(),
            pci_slots,
            compute,
            quirks,
            cpu_sensor,
        }
    }

    #[must_use]
    pub fn with_vendors(mut self, vendors: VendorMap) -> Self {
        self.vendors = vendors;
        self
    }

    #[must_use]
    pub fn with_pci_slots(mut self, pci_slots: PciSlotTable) -> Self {
        self.pci_slots = pci_slots;
        self
    }

    #[must_use]
    pub fn with_compute_devices(mut self, compute: Vec<ComputeDevice>) -> Self {
        self.compute = compute;
        self
    }

    #[must_use]
    pub fn with_quirks(mut self, quirks: QuirkTable) -> Self {
        self.quirks = quirks;
        self
    }

    #[must_use]
    pub fn with_cpu_sensor(mut self, path: impl Into<PathBuf>) -> Self {
        self.cpu_sensor = Some(path.into());
        self
    }

    #[must_use]
    pub fn tree(&self) -> &DeviceNode {
        &self.tree
    }

    #[must_use]
    pub fn vendors(&self) -> &VendorMap {
        &self.vendors
    }

    #[must_use]
    pub fn pci_slots(&self) -> &PciSlotTable {
        &self.pci_slots
    }

    #[must_use]
    pub fn quirks(&self) -> &QuirkTable {
        &self.quirks
    }

    #[must_use]
    pub fn cpu_sensor(&self) -> Option<&Path> {
        self.cpu_sensor.as_deref()
    }

    /// The `n`-th compute device of `kind`
    #[must_use]
    pub fn compute_device(&self, kind: ComputeKind, n: usize) -> Option<&ComputeDevice> {
        self.compute.iter().filter(|d| d.kind == kind).nth(n)
    }
}

/// `temp1_input` of the first hwmon device named like a CPU package sensor
fn find_cpu_sensor(io: &Collaborators) -> Option<PathBuf> {
    let root = Path::new(HWMON_ROOT);
    io.list(root).into_iter().find_map(|entry| {
        let dir = root.join(entry);
        let name = io.read(&dir.join("name"))?;
        CPU_SENSORS
            .contains(&name.trim())
            .then(|| dir.join("temp1_input"))
    })
}
