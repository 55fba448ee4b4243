//! Network adapter extraction

use crate::context::ScanContext;
use crate::identity::slot_for;
use crate::merge::HardwareRecord;
use crate::normalize::trim_bus_info;
use crate::tree::{Attr, DeviceClass, DeviceNode};
use crate::types::NetworkAdapter;

pub fn extract(node: &DeviceNode, adapters: &mut Vec<NetworkAdapter>, ctx: &ScanContext) {
    if node.class() != DeviceClass::Network {
        return;
    }

    let adapter = slot_for(adapters, &node.attr(Attr::Serial));
    adapter.merge(node);
    adapter.description.fill_if_absent(node.attr(Attr::Description));
    adapter.speed.fill_if_absent(node.config("speed"));
    if node.capacity() > 0 {
        adapter.capacity.fill_if_absent(node.capacity());
    }

    let vendor = ctx.vendors().clean(adapter.node.vendor.as_str());
    adapter.node.vendor.set(vendor);
    if let Some(bus) = adapter.node.bus_info.non_blank() {
        let bus = trim_bus_info(bus);
        adapter.node.bus_info.set(bus);
    }
}

#[must_use]
pub fn scan(ctx: &ScanContext) -> Vec<NetworkAdapter> {
    let mut adapters = Vec::new();
    for node in ctx.tree().search_by_class(DeviceClass::Network) {
        extract(node, &mut adapters, ctx);
    }
    adapters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nic(name: &str, serial: &str) -> DeviceNode {
        DeviceNode::new(DeviceClass::Network)
            .with_attr(Attr::Description, "Ethernet interface")
            .with_attr(Attr::Product, "RTL8125 2.5GbE Controller")
            .with_attr(Attr::Vendor, "Realtek Semiconductor Co., Ltd.")
            .with_attr(Attr::Serial, serial)
            .with_attr(Attr::LogicalName, name)
            .with_attr(Attr::BusInfo, "pci@0000:05:00.0")
            .with_capacity(2_500_000_000)
            .with_config("speed", "1Gbit/s")
    }

    #[test]
    fn test_extract_adapters() {
        let tree = DeviceNode::new(DeviceClass::System)
            .with_child(nic("enp5s0", "a8:a1:59:00:00:01"))
            .with_child(nic("enp6s0", "a8:a1:59:00:00:02"));
        let adapters = scan(&ScanContext::new(tree));

        assert_eq!(adapters.len(), 2);
        let first = &adapters[0];
        assert_eq!(first.node.bus_info.as_str(), "05");
        assert_eq!(first.speed.as_str(), "1Gbit/s");
        assert_eq!(first.capacity.copied(), Some(2_500_000_000));
        assert_eq!(first.node.vendor.as_str(), "Realtek Semiconductor Co., Ltd.");
    }

    #[test]
    fn test_guid_prefers_interface_name() {
        let mut named = Vec::new();
        extract(&nic("enp5s0", "x"), &mut named, &ScanContext::default());
        let mut renamed = Vec::new();
        extract(&nic("enp5s0", "y"), &mut renamed, &ScanContext::default());

        named[0].assign_guid();
        renamed[0].assign_guid();
        assert_eq!(named[0].guid, renamed[0].guid);
    }

    #[test]
    fn test_wireless_without_speed() {
        let node = DeviceNode::new(DeviceClass::Network)
            .with_attr(Attr::Description, "Wireless interface")
            .with_attr(Attr::LogicalName, "wlp4s0");
        let mut adapters = Vec::new();
        extract(&node, &mut adapters, &ScanContext::default());

        assert_eq!(adapters[0].speed.as_str(), "");
        assert!(adapters[0].capacity.is_absent());
    }
}
