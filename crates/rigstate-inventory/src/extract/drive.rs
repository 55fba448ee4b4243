//! Drive extraction

use tracing::debug;

use crate::context::ScanContext;
use crate::identity::slot_for;
use crate::merge::HardwareRecord;
use crate::normalize::{base_device_name, strip_annotation, trim_bus_info};
use crate::tree::{Attr, DeviceClass, DeviceNode};
use crate::types::DriveParameters;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Fold a disk or storage node into `drives`
///
/// Controller nodes, which carry neither a physical id nor a logical name,
/// are skipped. A record whose vendor turns out to be a bus vendor keeps only
/// its probe fields; [`finalize`] drops it.
pub fn extract(node: &DeviceNode, drives: &mut Vec<DriveParameters>, ctx: &ScanContext) {
    if !matches!(node.class(), DeviceClass::Disk | DeviceClass::Storage) {
        return;
    }
    if node.attr(Attr::PhysId).is_empty() && node.attr(Attr::LogicalName).is_empty() {
        return;
    }

    let drive = slot_for(drives, &node.attr(Attr::Serial));
    let name_open = drive.node.logical_name.is_open();
    drive.merge(node);
    drive.description.fill(node.attr(Attr::Description));

    let raw_name = node.attr(Attr::LogicalName);
    if name_open && !raw_name.trim().is_empty() {
        drive.node.logical_name.set(base_device_name(&raw_name));
    }

    let vendor = ctx.vendors().clean(drive.node.vendor.as_str());
    drive.node.vendor.set(vendor);
    if ctx.vendors().is_bus_vendor(drive.node.vendor.as_str()) {
        debug!(vendor = drive.node.vendor.as_str(), "bus controller, not a drive");
        return;
    }

    if let Some(bus) = drive.node.bus_info.non_blank() {
        let bus = trim_bus_info(bus);
        drive.node.bus_info.set(bus);
    }
    let product = strip_annotation(drive.node.product.as_str());
    drive.node.product.set(product);

    if drive.sector_size.is_absent()
        && let Some(size) = sector_size(node)
    {
        drive.sector_size.set(size);
    }

    let total = aggregate_capacity(node);
    if total > 0 && drive.total_mb.copied().is_none_or(|mb| mb == 0.0) {
        drive.total_mb.set(total as f64 / BYTES_PER_MB);
    }
}

/// Disk nodes first, then storage nodes
#[must_use]
pub fn scan(ctx: &ScanContext) -> Vec<DriveParameters> {
    let mut drives = Vec::new();
    for node in ctx.tree().search_by_class(DeviceClass::Disk) {
        extract(node, &mut drives, ctx);
    }
    for node in ctx.tree().search_by_class(DeviceClass::Storage) {
        extract(node, &mut drives, ctx);
    }
    drives
}

/// Drop records that turned out to be bus controllers
pub fn finalize(drives: &mut Vec<DriveParameters>, ctx: &ScanContext) {
    drives.retain(|drive| !ctx.vendors().is_bus_vendor(drive.node.vendor.as_str()));
}

/// Bytes under `node`
///
/// Each disk-class child contributes the sizes of its own children
/// (partitions), or its own size when it has none. Without disk children the
/// node's own size is used.
fn aggregate_capacity(node: &DeviceNode) -> u64 {
    let disks: Vec<&DeviceNode> = node
        .children()
        .iter()
        .filter(|child| child.class() == DeviceClass::Disk)
        .collect();

    if disks.is_empty() {
        return node.size();
    }

    disks
        .iter()
        .map(|disk| match disk.children() {
            [] => disk.size(),
            parts => parts.iter().map(DeviceNode::size).sum(),
        })
        .sum()
}

fn sector_size(node: &DeviceNode) -> Option<u64> {
    std::iter::once(node)
        .chain(node.children())
        .find_map(|n| n.config("sectorsize").trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_tree() -> DeviceNode {
        let nvme = DeviceNode::new(DeviceClass::Storage)
            .with_attr(Attr::Description, "NVMe device")
            .with_attr(Attr::Product, "Samsung SSD 980 PRO 1TB")
            .with_attr(Attr::Vendor, "Samsung Electronics Co Ltd")
            .with_attr(Attr::Serial, "ABC123")
            .with_attr(Attr::PhysId, "0")
            .with_attr(Attr::LogicalName, "/dev/nvme0")
            .with_attr(Attr::BusInfo, "pci@0000:01:00.0")
            .with_child(
                DeviceNode::new(DeviceClass::Disk)
                    .with_attr(Attr::Description, "NVMe disk")
                    .with_attr(Attr::Serial, "ABC123")
                    .with_attr(Attr::PhysId, "1")
                    .with_attr(Attr::LogicalName, "/dev/nvme0n1")
                    .with_config("sectorsize", "512")
                    .with_child(
                        DeviceNode::new(DeviceClass::Volume)
                            .with_attr(Attr::LogicalName, "/dev/nvme0n1p1")
                            .with_size(512_000),
                    ),
            );
        DeviceNode::new(DeviceClass::System).with_child(nvme)
    }

    #[test]
    fn test_shared_serial_aggregates_one_drive() {
        let ctx = ScanContext::new(scenario_tree());
        let mut drives = scan(&ctx);
        finalize(&mut drives, &ctx);

        assert_eq!(drives.len(), 1);
        let drive = &drives[0];
        assert_eq!(drive.node.serial.as_str(), "ABC123");
        assert_eq!(drive.node.logical_name.as_str(), "nvme0");
        assert_eq!(drive.total_mb.copied(), Some(512_000.0 / 1024.0 / 1024.0));
        assert_eq!(drive.sector_size.copied(), Some(512));
    }

    #[test]
    fn test_controller_without_names_skipped() {
        let node = DeviceNode::new(DeviceClass::Storage).with_attr(Attr::Description, "SATA controller");
        let mut drives = Vec::new();
        extract(&node, &mut drives, &ScanContext::default());
        assert!(drives.is_empty());
    }

    #[test]
    fn test_bus_vendor_dropped_at_finalize() {
        let ctx = ScanContext::default();
        let node = DeviceNode::new(DeviceClass::Storage)
            .with_attr(Attr::Vendor, "Advanced Micro Devices, Inc. [AMD]")
            .with_attr(Attr::PhysId, "0")
            .with_size(4096);
        let mut drives = Vec::new();
        extract(&node, &mut drives, &ctx);

        assert_eq!(drives.len(), 1);
        assert!(drives[0].total_mb.is_absent());
        finalize(&mut drives, &ctx);
        assert!(drives.is_empty());
    }

    #[test]
    fn test_sata_disk_fields() {
        let node = DeviceNode::new(DeviceClass::Disk)
            .with_attr(Attr::Product, "ST2000DM008-2FR1 [Barracuda]")
            .with_attr(Attr::Vendor, "Seagate")
            .with_attr(Attr::Serial, "ZFL0ABCD")
            .with_attr(Attr::PhysId, "0.0.0")
            .with_attr(Attr::LogicalName, "/dev/sda")
            .with_attr(Attr::BusInfo, "pci@0000:00:17.0")
            .with_size(2_000_398_934_016);
        let mut drives = Vec::new();
        extract(&node, &mut drives, &ScanContext::default());

        let drive = &drives[0];
        assert_eq!(drive.node.product.as_str(), "ST2000DM008-2FR1");
        assert_eq!(drive.node.logical_name.as_str(), "sda");
        assert_eq!(drive.node.bus_info.as_str(), "00");
        assert_eq!(drive.total_mb.copied(), Some(2_000_398_934_016.0 / 1024.0 / 1024.0));
    }

    #[test]
    fn test_repeated_merges_keep_logical_name() {
        let ctx = ScanContext::default();
        let node = DeviceNode::new(DeviceClass::Disk)
            .with_attr(Attr::Serial, "R1")
            .with_attr(Attr::PhysId, "0")
            .with_attr(Attr::LogicalName, "/dev/md127");
        let mut drives = Vec::new();

        extract(&node, &mut drives, &ctx);
        let first = drives[0].clone();
        extract(&node, &mut drives, &ctx);
        extract(&node, &mut drives, &ctx);

        assert_eq!(drives.len(), 1);
        assert_eq!(drives[0].node.logical_name.as_str(), "md127");
        assert_eq!(drives[0], first);
    }
}
