//! Memory module extraction

use crate::context::ScanContext;
use crate::extract::{bytes_to_mb, hz_to_mhz};
use crate::identity::push_distinct;
use crate::merge::HardwareRecord;
use crate::normalize::trim_bus_info;
use crate::tree::{Attr, DeviceClass, DeviceNode};
use crate::types::RamCard;

const EMPTY_SLOT: &str = "[empty]";
const UNKNOWN_TYPE: &str = "Unknown";
const EMPTY_SUFFIX: &str = " (empty)";

/// Fold a populated memory bank into `cards`
///
/// Unpopulated banks (width 0 or description `[empty]`) and cache nodes are
/// skipped.
pub fn extract(node: &DeviceNode, cards: &mut Vec<RamCard>, _ctx: &ScanContext) {
    let description = node.attr(Attr::Description);
    if node.class() != DeviceClass::Memory || node.width() == 0 || description == EMPTY_SLOT {
        return;
    }

    let mut card = RamCard::default();
    card.merge(node);
    card.total_mb.set(bytes_to_mb(node.size()));
    card.speed.set(hz_to_mhz(node.clock()));
    card.configured_speed.set(hz_to_mhz(node.clock()));
    card.width.set(node.width());
    card.kind.set(description);
    if let Some(bus) = card.node.bus_info.non_blank() {
        let bus = trim_bus_info(bus);
        card.node.bus_info.set(bus);
    }

    push_distinct(cards, card);
}

#[must_use]
pub fn scan(ctx: &ScanContext) -> Vec<RamCard> {
    let mut cards = Vec::new();
    for node in ctx.tree().search_by_class(DeviceClass::Memory) {
        extract(node, &mut cards, ctx);
    }
    cards
}

/// Mark banks of unknown type as empty in their product name
pub fn finalize(cards: &mut [RamCard], _ctx: &ScanContext) {
    for card in cards.iter_mut() {
        if card.kind.as_str() != UNKNOWN_TYPE || card.node.product.as_str().ends_with(EMPTY_SUFFIX) {
            continue;
        }
        let product = format!("{}{EMPTY_SUFFIX}", card.node.product.as_str());
        card.node.product.set(product);
    }
}
