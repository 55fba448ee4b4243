//! Attribute merge core
//!
//! Every domain record carries the same block of probe-derived identity
//! fields. [`NodeFields::merge_from`] is the single fill-if-empty rule all
//! extractors apply to it.

use serde::{Deserialize, Serialize};

use crate::field::Field;
use crate::guid::Guid;
use crate::tree::{Attr, DeviceNode};

/// Probe fields shared by every hardware record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFields {
    pub serial: Field<String>,
    pub product: Field<String>,
    pub vendor: Field<String>,
    pub phys_id: Field<String>,
    pub slot: Field<String>,
    pub logical_name: Field<String>,
    pub version: Field<String>,
    pub bus_info: Field<String>,
}

impl NodeFields {
    /// Fill every absent or blank field from `node`
    ///
    /// Fields that already hold a value are left untouched, so repeated merges
    /// from sibling nodes only ever add information.
    pub fn merge_from(&mut self, node: &DeviceNode) {
        self.serial.fill(node.attr(Attr::Serial));
        self.product.fill(node.attr(Attr::Product));
        self.vendor.fill(node.attr(Attr::Vendor));
        self.phys_id.fill(node.attr(Attr::PhysId));
        self.slot.fill(node.attr(Attr::Slot));
        self.logical_name.fill(node.attr(Attr::LogicalName));
        self.version.fill(node.attr(Attr::Version));
        self.bus_info.fill(node.attr(Attr::BusInfo));
    }
}

/// A per-domain hardware record
pub trait HardwareRecord {
    fn node_fields(&self) -> &NodeFields;

    fn node_fields_mut(&mut self) -> &mut NodeFields;

    fn guid(&self) -> &Field<Guid>;

    fn guid_mut(&mut self) -> &mut Field<Guid>;

    /// Static fields the GUID is derived from, in hashing order
    fn identity_parts(&self) -> Vec<String>;

    /// Merge `node` into this record's probe fields
    fn merge(&mut self, node: &DeviceNode) {
        self.node_fields_mut().merge_from(node);
    }

    /// Compute the GUID once; later calls keep the first value
    fn assign_guid(&mut self) {
        if self.guid().is_present() {
            return;
        }
        let parts = self.identity_parts();
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        self.guid_mut().set(Guid::derive(&parts));
    }
}
