//! Device tree adapter
//!
//! Read-only view over the hardware probe's tree (`lshw -json`). Extractors
//! only see nodes through the getters here, so everything about the probe's
//! JSON quirks (numbers as strings, one-or-many logical names) stays local.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::InventoryError;

// ============================================================================
// Classes and attributes
// ============================================================================

/// Class tag of a device node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "String")]
pub enum DeviceClass {
    System,
    Bridge,
    Memory,
    Processor,
    Address,
    Storage,
    Disk,
    Tape,
    Bus,
    Network,
    Display,
    Input,
    Printer,
    Multimedia,
    Communication,
    Power,
    Volume,
    Generic,
    #[default]
    Other,
}

impl From<String> for DeviceClass {
    fn from(tag: String) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "system" => DeviceClass::System,
            "bridge" => DeviceClass::Bridge,
            "memory" => DeviceClass::Memory,
            "processor" => DeviceClass::Processor,
            "address" => DeviceClass::Address,
            "storage" => DeviceClass::Storage,
            "disk" => DeviceClass::Disk,
            "tape" => DeviceClass::Tape,
            "bus" => DeviceClass::Bus,
            "network" => DeviceClass::Network,
            "display" => DeviceClass::Display,
            "input" => DeviceClass::Input,
            "printer" => DeviceClass::Printer,
            "multimedia" => DeviceClass::Multimedia,
            "communication" => DeviceClass::Communication,
            "power" => DeviceClass::Power,
            "volume" => DeviceClass::Volume,
            "generic" => DeviceClass::Generic,
            _ => DeviceClass::Other,
        }
    }
}

/// Named node attributes, all readable as strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    Serial,
    Product,
    Vendor,
    PhysId,
    Slot,
    LogicalName,
    Version,
    BusInfo,
    Description,
    SubVendor,
    Capacity,
    Width,
    Clock,
    Size,
}

// ============================================================================
// Device Node
// ============================================================================

/// One node of the probe tree
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeviceNode {
    #[serde(default)]
    class: DeviceClass,
    #[serde(default)]
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    product: String,
    #[serde(default)]
    vendor: String,
    #[serde(default, alias = "subsysvendor")]
    subvendor: String,
    #[serde(default)]
    serial: String,
    #[serde(default)]
    slot: String,
    #[serde(default)]
    version: String,
    #[serde(default, rename = "physid")]
    phys_id: String,
    #[serde(default, rename = "businfo")]
    bus_info: String,
    #[serde(default, rename = "logicalname", deserialize_with = "one_or_many")]
    logical_names: Vec<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    size: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    capacity: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    width: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    clock: Option<u64>,
    #[serde(default, rename = "configuration", deserialize_with = "string_map")]
    config: BTreeMap<String, String>,
    #[serde(default)]
    children: Vec<DeviceNode>,
}

impl DeviceNode {
    /// Create an empty node of the given class
    #[must_use]
    pub fn new(class: DeviceClass) -> Self {
        Self {
            class,
            ..Self::default()
        }
    }

    /// Parse the JSON document printed by `lshw -json`
    ///
    /// Newer lshw releases wrap the root in a one-element array; several
    /// top-level nodes are gathered under a synthetic root.
    ///
    /// # Errors
    ///
    /// Returns [`InventoryError::InvalidTree`] if the text is not a node
    /// object or array of node objects.
    pub fn from_json(text: &str) -> Result<Self, InventoryError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| InventoryError::InvalidTree(e.to_string()))?;

        let root = match value {
            Value::Array(mut nodes) if nodes.len() == 1 => nodes.remove(0),
            Value::Array(nodes) if nodes.is_empty() => {
                return Err(InventoryError::InvalidTree("empty node list".into()));
            }
            Value::Array(nodes) => {
                let children = nodes
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<Result<Vec<DeviceNode>, _>>()
                    .map_err(|e| InventoryError::InvalidTree(e.to_string()))?;
                return Ok(Self {
                    id: "root".into(),
                    children,
                    ..Self::default()
                });
            }
            other => other,
        };

        if !root.is_object() {
            return Err(InventoryError::InvalidTree("root is not an object".into()));
        }
        serde_json::from_value(root).map_err(|e| InventoryError::InvalidTree(e.to_string()))
    }

    /// Class tag
    #[must_use]
    pub fn class(&self) -> DeviceClass {
        self.class
    }

    /// Probe-assigned node id (`cpu:0`, `bank:1`, ...)
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Attribute as a string, empty when the probe did not report it
    #[must_use]
    pub fn attr(&self, attr: Attr) -> String {
        let number = |v: Option<u64>| v.map(|n| n.to_string()).unwrap_or_default();
        match attr {
            Attr::Serial => self.serial.clone(),
            Attr::Product => self.product.clone(),
            Attr::Vendor => self.vendor.clone(),
            Attr::PhysId => self.phys_id.clone(),
            Attr::Slot => self.slot.clone(),
            Attr::LogicalName => self.logical_names.first().cloned().unwrap_or_default(),
            Attr::Version => self.version.clone(),
            Attr::BusInfo => self.bus_info.clone(),
            Attr::Description => self.description.clone(),
            Attr::SubVendor => self.subvendor.clone(),
            Attr::Capacity => number(self.capacity),
            Attr::Width => number(self.width),
            Attr::Clock => number(self.clock),
            Attr::Size => number(self.size),
        }
    }

    /// Size in the probe's unit (bytes for memory and disks, Hz for CPUs), 0 if absent
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size.unwrap_or(0)
    }

    /// Capacity, 0 if absent
    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.capacity.unwrap_or(0)
    }

    /// Bus width in bits, 0 if absent
    #[must_use]
    pub fn width(&self) -> u64 {
        self.width.unwrap_or(0)
    }

    /// Clock in Hz, 0 if absent
    #[must_use]
    pub fn clock(&self) -> u64 {
        self.clock.unwrap_or(0)
    }

    /// Configuration value, empty when the key is missing
    #[must_use]
    pub fn config(&self, key: &str) -> String {
        self.config.get(key).cloned().unwrap_or_default()
    }

    /// Ordered children
    #[must_use]
    pub fn children(&self) -> &[DeviceNode] {
        &self.children
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn child(&self, index: usize) -> Option<&DeviceNode> {
        self.children.get(index)
    }

    /// Depth-first, pre-order list of all nodes (this one included) of `class`
    #[must_use]
    pub fn search_by_class(&self, class: DeviceClass) -> Vec<&DeviceNode> {
        let mut found = Vec::new();
        self.collect_class(class, &mut found);
        found
    }

    /// First node of `class` in pre-order
    #[must_use]
    pub fn find_first(&self, class: DeviceClass) -> Option<&DeviceNode> {
        if self.class == class {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_first(class))
    }

    fn collect_class<'a>(&'a self, class: DeviceClass, found: &mut Vec<&'a DeviceNode>) {
        if self.class == class {
            found.push(self);
        }
        for child in &self.children {
            child.collect_class(class, found);
        }
    }

    // ------------------------------------------------------------------------
    // Builders (offline fixtures and tests)
    // ------------------------------------------------------------------------

    /// Set an attribute; numeric attributes are parsed from `value`
    #[must_use]
    pub fn with_attr(mut self, attr: Attr, value: impl Into<String>) -> Self {
        let value = value.into();
        let number = || value.trim().parse::<u64>().ok();
        match attr {
            Attr::Serial => self.serial = value,
            Attr::Product => self.product = value,
            Attr::Vendor => self.vendor = value,
            Attr::PhysId => self.phys_id = value,
            Attr::Slot => self.slot = value,
            Attr::LogicalName => self.logical_names = vec![value],
            Attr::Version => self.version = value,
            Attr::BusInfo => self.bus_info = value,
            Attr::Description => self.description = value,
            Attr::SubVendor => self.subvendor = value,
            Attr::Capacity => self.capacity = number(),
            Attr::Width => self.width = number(),
            Attr::Clock => self.clock = number(),
            Attr::Size => self.size = number(),
        }
        self
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub fn with_width(mut self, width: u64) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: u64) -> Self {
        self.clock = Some(clock);
        self
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    #[must_use]
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: DeviceNode) -> Self {
        self.children.push(child);
        self
    }
}

// ============================================================================
// Lenient field decoding
// ============================================================================

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => vec![s],
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    })
}

fn string_map<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSHW: &str = r#"[{
      "id" : "rig",
      "class" : "system",
      "product" : "MS-7C56 (Default string)",
      "vendor" : "Micro-Star International Co., Ltd.",
      "serial" : "To be filled by O.E.M.",
      "configuration" : { "boot" : "normal", "family" : "Default string" },
      "children" : [
        {
          "id" : "core",
          "class" : "bus",
          "children" : [
            {
              "id" : "cpu",
              "class" : "processor",
              "product" : "AMD Ryzen 5 5600X 6-Core Processor",
              "vendor" : "Advanced Micro Devices [AMD]",
              "physid" : "12",
              "businfo" : "cpu@0",
              "size" : 3700000000,
              "capacity" : "4650000000",
              "width" : 64,
              "clock" : 100000000,
              "configuration" : { "cores" : "6", "enabledcores" : "6", "threads" : "12" }
            },
            {
              "id" : "disk",
              "class" : "disk",
              "logicalname" : ["/dev/sda", "/dev/sda1"],
              "size" : 512110190592
            }
          ]
        }
      ]
    }]"#;

    #[test]
    fn test_from_json_array_root() {
        let root = DeviceNode::from_json(LSHW).unwrap();

        assert_eq!(root.class(), DeviceClass::System);
        assert_eq!(root.config("boot"), "normal");
        assert_eq!(root.child_count(), 1);
        assert_eq!(root.child(0).unwrap().id(), "core");
    }

    #[test]
    fn test_lenient_numbers_and_names() {
        let root = DeviceNode::from_json(LSHW).unwrap();
        let cpu = root.find_first(DeviceClass::Processor).unwrap();

        assert_eq!(cpu.capacity(), 4_650_000_000);
        assert_eq!(cpu.attr(Attr::Width), "64");
        assert_eq!(cpu.config("threads"), "12");
        assert_eq!(cpu.attr(Attr::Serial), "");

        let disk = root.find_first(DeviceClass::Disk).unwrap();
        assert_eq!(disk.attr(Attr::LogicalName), "/dev/sda");
    }

    #[test]
    fn test_search_by_class_preorder() {
        let tree = DeviceNode::new(DeviceClass::System)
            .with_child(
                DeviceNode::new(DeviceClass::Disk)
                    .with_id("outer")
                    .with_child(DeviceNode::new(DeviceClass::Disk).with_id("inner")),
            )
            .with_child(DeviceNode::new(DeviceClass::Disk).with_id("second"));

        let ids: Vec<&str> = tree
            .search_by_class(DeviceClass::Disk)
            .iter()
            .map(|n| n.id())
            .collect();
        assert_eq!(ids, vec!["outer", "inner", "second"]);
    }

    #[test]
    fn test_unknown_class_and_invalid_tree() {
        let node = DeviceNode::from_json(r#"{"class": "sensor"}"#).unwrap();
        assert_eq!(node.class(), DeviceClass::Other);

        assert!(matches!(
            DeviceNode::from_json("[]"),
            Err(InventoryError::InvalidTree(_))
        ));
        assert!(matches!(
            DeviceNode::from_json("\"text\""),
            Err(InventoryError::InvalidTree(_))
        ));
    }
}
