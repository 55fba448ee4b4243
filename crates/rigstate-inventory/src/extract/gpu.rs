//! GPU extraction and vendor static initialisation

use std::path::Path;

use tracing::{debug, warn};

use crate::collab::Collaborators;
use crate::context::ScanContext;
use crate::merge::HardwareRecord;
use crate::normalize::strip_annotation;
use crate::parse::clinfo::ComputeKind;
use crate::parse::pci::parse_modalias;
use crate::tree::{Attr, DeviceClass, DeviceNode};
use crate::types::{GpuParameters, GpuVendor, PciIds};
use crate::vendor::{GpuBackend, GpuLimits, GpuMetric};

/// Description lshw gives display controllers that drive outputs
pub const VGA_DESCRIPTION: &str = "VGA compatible controller";

const PCI_DEVICES: &str = "/sys/bus/pci/devices";

/// Fold a VGA display node into `gpus`
///
/// The candidate is dropped when it equals the last record apart from its
/// positional id. `actual_id` counts earlier records of the same vendor.
pub fn extract(node: &DeviceNode, gpus: &mut Vec<GpuParameters>, ctx: &ScanContext) {
    if node.class() != DeviceClass::Display || node.attr(Attr::Description) != VGA_DESCRIPTION {
        return;
    }

    let mut gpu = GpuParameters::default();
    gpu.merge(node);
    gpu.description.fill(node.attr(Attr::Description));
    if node.width() > 0 {
        gpu.vram.set(node.width());
    }

    let vendor = ctx.vendors().clean(gpu.node.vendor.as_str());
    let kind = if vendor.to_lowercase().contains("nvidia") {
        GpuVendor::Nvidia
    } else {
        GpuVendor::Amd
    };
    gpu.node.vendor.set(vendor);
    gpu.kind.set(kind);
    gpu.subvendor.fill(strip_annotation(&node.attr(Attr::SubVendor)));

    let raw_bus = gpu.node.bus_info.as_str().to_string();
    let bus = raw_bus.replace("pci@0000:", "").replace(":00.0", "");
    let drm_slot = u32::from_str_radix(&bus, 16)
        .ok()
        .and_then(|bus| ctx.pci_slots().slot_for_bus(bus));
    gpu.pci_info.set(raw_bus);
    gpu.node.bus_info.set(bus);
    if let Some(slot) = drm_slot {
        gpu.node.phys_id.set(slot.to_string());
    }

    if let Some(last) = gpus.last()
        && is_same_device(last, &gpu)
    {
        debug!(product = gpu.node.product.as_str(), "duplicate display node skipped");
        return;
    }

    let actual_id = gpus.iter().filter(|g| g.kind.copied() == Some(kind)).count() as u32;
    let backend = match kind {
        GpuVendor::Amd => GpuBackend::for_vendor(kind, drm_slot.unwrap_or(actual_id)),
        GpuVendor::Nvidia => GpuBackend::for_vendor(kind, actual_id),
    };
    gpu.actual_id.set(actual_id);
    gpu.info_provider.set(backend.provider().to_string());
    gpu.backend = Some(backend);
    gpus.push(gpu);
}

fn is_same_device(last: &GpuParameters, candidate: &GpuParameters) -> bool {
    let mut probe = candidate.clone();
    probe.actual_id = last.actual_id.clone();
    probe.info_provider = last.info_provider.clone();
    probe.backend = last.backend.clone();
    probe == *last
}

#[must_use]
pub fn scan(ctx: &ScanContext) -> Vec<GpuParameters> {
    let mut gpus = Vec::new();
    for node in ctx.tree().search_by_class(DeviceClass::Display) {
        extract(node, &mut gpus, ctx);
    }
    gpus
}

/// Compute units and driver version from the compute runtime
pub fn finalize(gpus: &mut [GpuParameters], ctx: &ScanContext) {
    for (n, gpu) in gpus.iter_mut().enumerate() {
        let Some(device) = ctx.compute_device(ComputeKind::Gpu, n) else {
            continue;
        };
        gpu.compute_units
            .fill_with(device.compute_units.map(|u| ctx.quirks().compute_units(u)));
        if !device.driver_version.is_empty() {
            gpu.driver_version.fill(device.driver_version.clone());
        }
    }
}

/// PCI ids, subvendor fallback and vendor limits, read from the host
pub fn enrich(gpus: &mut [GpuParameters], ctx: &ScanContext, io: &Collaborators) {
    for gpu in gpus.iter_mut() {
        if let Some(address) = gpu.pci_info.as_str().strip_prefix("pci@") {
            let path = Path::new(PCI_DEVICES).join(address).join("modalias");
            if let Some(text) = io.read(&path) {
                match parse_modalias(&text) {
                    Ok(alias) => gpu.pci_ids = PciIds::from(alias),
                    Err(e) => warn!(error = %e, path = %path.display(), "bad modalias"),
                }
            }
        }

        if gpu.subvendor.is_open()
            && let Some(name) = gpu
                .pci_ids
                .subvendor
                .get()
                .and_then(|id| ctx.vendors().pci_vendor(id))
        {
            gpu.subvendor.set(name.to_string());
        }

        let Some(backend) = gpu.backend.as_mut() else {
            continue;
        };
        backend.discover(io);
        let limits = backend.limits(io);
        let fan = backend.read(io, GpuMetric::FanSpeed);
        apply_limits(gpu, &limits);
        gpu.fan.default.fill_with(fan);
    }
}

/// Fill the GPU's advertised ranges from the backend's limits
pub fn apply_limits(gpu: &mut GpuParameters, limits: &GpuLimits) {
    gpu.power_limit.fill_bounds(limits.power_limit);
    gpu.power_limit.default.fill_with(limits.power_limit_default);
    gpu.fan.fill_bounds(limits.fan);
    gpu.temperature.min.fill_if_absent(0);
    gpu.temperature.max.fill_with(limits.temperature_max);
    gpu.temperature.default.fill_with(limits.temperature_max);
    gpu.core_clock.fill_bounds(limits.core_clock);
    gpu.core_clock.default.fill_with(limits.core_clock_default);
    gpu.memory_clock.fill_bounds(limits.memory_clock);
    gpu.memory_clock.default.fill_with(limits.memory_clock_default);
    gpu.core_voltage.fill_bounds(limits.core_voltage);
    gpu.memory_voltage.fill_bounds(limits.memory_voltage);
    gpu.core_clock_offset.fill_bounds(limits.core_clock_offset);
    gpu.memory_clock_offset.fill_bounds(limits.memory_clock_offset);
}
