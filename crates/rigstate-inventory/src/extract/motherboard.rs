//! Motherboard extraction
//!
//! Single-instance domain: every system node folds into one record.

use tracing::{debug, warn};

use crate::collab::Collaborators;
use crate::context::ScanContext;
use crate::merge::HardwareRecord;
use crate::normalize::{char_slice, strip_placeholder};
use crate::parse::memory::parse_dmidecode_handles;
use crate::parse::pci::parse_lspci;
use crate::parse::usb::parse_lsusb;
use crate::tree::{Attr, DeviceClass, DeviceNode};
use crate::types::MotherboardParameters;

const BIOS_DESCRIPTION: &str = "BIOS";

pub fn extract(node: &DeviceNode, board: &mut Option<MotherboardParameters>, _ctx: &ScanContext) {
    match node.class() {
        DeviceClass::System => {
            let board = board.get_or_insert_with(MotherboardParameters::default);
            board.merge(node);
            board.description.fill(node.attr(Attr::Description));
            board.boot_type.fill(node.config("boot"));
            board.family.fill(node.config("family"));

            if let Some(bus) = board.node.bus_info.non_blank()
                && bus.chars().count() > 5
            {
                let bus = char_slice(bus, 9, 2);
                board.node.bus_info.set(bus);
            }
            let product = strip_placeholder(board.node.product.as_str());
            board.node.product.set(product);
        }
        DeviceClass::Memory if node.attr(Attr::Description) == BIOS_DESCRIPTION => {
            if let Some(board) = board.as_mut() {
                board.bios_version.fill(node.attr(Attr::Version));
            }
        }
        _ => {}
    }
}

/// System nodes, then the BIOS memory node
#[must_use]
pub fn scan(ctx: &ScanContext) -> Option<MotherboardParameters> {
    let mut board = None;
    for node in ctx.tree().search_by_class(DeviceClass::System) {
        extract(node, &mut board, ctx);
    }
    if let Some(bios) = ctx
        .tree()
        .search_by_class(DeviceClass::Memory)
        .into_iter()
        .find(|n| n.attr(Attr::Description) == BIOS_DESCRIPTION)
    {
        extract(bios, &mut board, ctx);
    }
    board
}

/// PCI slots, USB devices and the DIMM slot count
pub fn enrich(board: &mut MotherboardParameters, io: &Collaborators) {
    if board.pci_slots.is_empty()
        && let Some(text) = io.run("lspci", &[])
    {
        match parse_lspci(&text) {
            Ok(slots) => board.pci_slots = slots,
            Err(e) => warn!(error = %e, "lspci output not understood"),
        }
    }

    if board.usb_devices.is_empty()
        && let Some(text) = io.run("lsusb", &[])
    {
        match parse_lsusb(&text) {
            Ok(devices) => board.usb_devices = devices,
            Err(e) => warn!(error = %e, "lsusb output not understood"),
        }
    }

    if board.memory_slots.is_absent()
        && let Some(text) = io.run("dmidecode", &["-t", "memory"])
    {
        let handles = parse_dmidecode_handles(&text);
        debug!(count = handles.len(), "memory device handles");
        board.memory_slots.set(handles.len() as u32);
    }
}
