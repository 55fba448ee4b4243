//! CPU extraction

use tracing::debug;

use crate::context::ScanContext;
use crate::extract::{config_u32, hz_to_mhz};
use crate::identity::slot_for;
use crate::merge::HardwareRecord;
use crate::parse::clinfo::ComputeKind;
use crate::tree::{Attr, DeviceClass, DeviceNode};
use crate::types::CpuParameters;

const DEFAULT_ARCHITECTURE: &str = "x86_64";
const DEFAULT_OP_MODE: &str = "32-bit, 64-bit";
const TEMPERATURE_MAX: i64 = 95;

/// Fold a processor node, or a cache node of the last processor, into `cpus`
pub fn extract(node: &DeviceNode, cpus: &mut Vec<CpuParameters>, ctx: &ScanContext) {
    match node.class() {
        DeviceClass::Processor => extract_processor(node, cpus, ctx),
        DeviceClass::Memory => extract_cache(node, cpus),
        _ => {}
    }
}

/// Processor nodes first, then memory nodes for the cache levels
#[must_use]
pub fn scan(ctx: &ScanContext) -> Vec<CpuParameters> {
    let mut cpus = Vec::new();
    for node in ctx.tree().search_by_class(DeviceClass::Processor) {
        extract(node, &mut cpus, ctx);
    }
    for node in ctx.tree().search_by_class(DeviceClass::Memory) {
        extract(node, &mut cpus, ctx);
    }
    cpus
}

/// Compute units (quirk-corrected) and the temperature sensor
pub fn finalize(cpus: &mut [CpuParameters], ctx: &ScanContext) {
    for (n, cpu) in cpus.iter_mut().enumerate() {
        let units = ctx
            .compute_device(ComputeKind::Cpu, n)
            .and_then(|device| device.compute_units)
            .map(|units| ctx.quirks().compute_units(units));
        cpu.compute_units.fill_with(units);

        if cpu.temperature_input.is_none() {
            cpu.temperature_input = ctx.cpu_sensor().map(Into::into);
        }
    }
}

fn extract_processor(node: &DeviceNode, cpus: &mut Vec<CpuParameters>, ctx: &ScanContext) {
    let cpu = slot_for(cpus, &node.attr(Attr::Serial));
    cpu.merge(node);

    if let Some(vendor) = cpu.node.vendor.non_blank() {
        let vendor = ctx.vendors().clean(vendor);
        cpu.node.vendor.set(vendor);
    }

    cpu.architecture.fill_if_absent(DEFAULT_ARCHITECTURE.into());
    cpu.op_mode.fill_if_absent(DEFAULT_OP_MODE.into());

    let min = hz_to_mhz(node.clock());
    if min > 0 {
        cpu.clock.min.fill_if_absent(min as i64);
        cpu.clock.default.fill_if_absent(min as i64);
    }
    let max = hz_to_mhz(node.size());
    if max > 0 {
        cpu.clock.max.fill_if_absent(max as i64);
    }

    cpu.cores.fill_with(config_u32(node, "cores"));
    cpu.enabled_cores.fill_with(config_u32(node, "enabledcores"));
    cpu.threads.fill_with(config_u32(node, "threads"));
    cpu.sockets.fill_if_absent(1);
    derive_topology(cpu);

    cpu.temperature.min.fill_if_absent(0);
    cpu.temperature.max.fill_if_absent(TEMPERATURE_MAX);
    cpu.temperature.default.fill_if_absent(TEMPERATURE_MAX);
    cpu.power.min.fill_if_absent(0);
}

/// Ratios are skipped when their denominator is zero or unknown
fn derive_topology(cpu: &mut CpuParameters) {
    if let (Some(threads), Some(cores)) = (cpu.threads.copied(), cpu.cores.copied())
        && cores != 0
    {
        cpu.thread_per_core.fill_if_absent(threads / cores);
    }
    if let (Some(cores), Some(sockets)) = (cpu.cores.copied(), cpu.sockets.copied())
        && sockets != 0
    {
        cpu.cores_per_socket.fill_if_absent(cores / sockets);
    }
}

/// Memory nodes with a size, no bus width and not the BIOS are caches
fn extract_cache(node: &DeviceNode, cpus: &mut [CpuParameters]) {
    if node.size() == 0 || node.width() != 0 || node.attr(Attr::Description) == "BIOS" {
        return;
    }
    let Some(cpu) = cpus.last_mut() else {
        debug!(node = node.id(), "cache node without a processor");
        return;
    };

    let kb = node.size() / 1024;
    match node.config("level").trim() {
        "1" => cpu.cache.l1_kb.fill_if_absent(kb),
        "2" => cpu.cache.l2_kb.fill_if_absent(kb),
        "3" => cpu.cache.l3_kb.fill_if_absent(kb),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::parse::clinfo::ComputeDevice;

    fn processor() -> DeviceNode {
        DeviceNode::new(DeviceClass::Processor)
            .with_id("cpu")
            .with_attr(Attr::Product, "AMD Ryzen 5 5600X 6-Core Processor")
            .with_attr(Attr::Vendor, "Advanced Micro Devices [AMD]")
            .with_attr(Attr::Serial, "")
            .with_size(4_650_000_000)
            .with_clock(100_000_000)
            .with_config("cores", "6")
            .with_config("enabledcores", "6")
            .with_config("threads", "12")
    }

    fn l2_cache() -> DeviceNode {
        DeviceNode::new(DeviceClass::Memory)
            .with_id("cache:1")
            .with_attr(Attr::Description, "L2 cache")
            .with_size(3_145_728)
            .with_config("level", "2")
    }

    fn tree() -> DeviceNode {
        DeviceNode::new(DeviceClass::System).with_child(
            DeviceNode::new(DeviceClass::Bus)
                .with_child(processor().with_child(l2_cache()))
                .with_child(
                    DeviceNode::new(DeviceClass::Memory)
                        .with_attr(Attr::Description, "BIOS")
                        .with_size(65_536),
                ),
        )
    }

    #[test]
    fn test_scan_cpu() {
        let ctx = ScanContext::new(tree());
        let cpus = scan(&ctx);

        assert_eq!(cpus.len(), 1);
        let cpu = &cpus[0];
        assert_eq!(cpu.node.vendor.as_str(), "AMD");
        assert_eq!(cpu.architecture.as_str(), "x86_64");
        assert_eq!(cpu.clock.min.copied(), Some(100));
        assert_eq!(cpu.clock.max.copied(), Some(4650));
        assert_eq!(cpu.thread_per_core.copied(), Some(2));
        assert_eq!(cpu.cores_per_socket.copied(), Some(6));
        assert_eq!(cpu.cache.l2_kb.copied(), Some(3072));
        assert!(cpu.cache.l1_kb.is_absent());
        assert_eq!(cpu.temperature.max.copied(), Some(95));
    }

    #[test]
    fn test_extract_twice_is_idempotent() {
        let ctx = ScanContext::new(tree());
        let mut cpus = scan(&ctx);
        let first = cpus.clone();

        extract(&processor(), &mut cpus, &ctx);
        extract(&l2_cache(), &mut cpus, &ctx);

        assert_eq!(cpus, first);
        assert_eq!(scan(&ctx), first);
    }

    #[test]
    fn test_zero_cores_skips_ratio() {
        let node = DeviceNode::new(DeviceClass::Processor)
            .with_config("threads", "8")
            .with_config("cores", "0");
        let mut cpus = Vec::new();
        extract(&node, &mut cpus, &ScanContext::default());

        assert_eq!(cpus[0].threads.copied(), Some(8));
        assert_eq!(cpus[0].thread_per_core, Field::Absent);
    }

    #[test]
    fn test_cache_without_processor_is_ignored() {
        let mut cpus = Vec::new();
        extract(&l2_cache(), &mut cpus, &ScanContext::default());
        assert!(cpus.is_empty());
    }

    #[test]
    fn test_finalize_applies_compute_quirk() {
        let ctx = ScanContext::new(tree())
            .with_compute_devices(vec![ComputeDevice {
                kind: ComputeKind::Cpu,
                compute_units: Some(14),
                ..ComputeDevice::default()
            }])
            .with_cpu_sensor("/sys/class/hwmon/hwmon2/temp1_input");
        let mut cpus = scan(&ctx);
        finalize(&mut cpus, &ctx);

        assert_eq!(cpus[0].compute_units.copied(), Some(36));
        assert!(cpus[0].temperature_input.is_some());
    }
}
