//! Dynamic telemetry refresh
//!
//! Re-reads the mutable fields of each record and replaces them. A reading
//! that fails leaves the previous value in place; the collaborator layer has
//! already logged why.

use std::path::Path;

use tracing::{trace, warn};

use crate::collab::Collaborators;
use crate::error::InventoryError;
use crate::field::Field;
use crate::parse::net::parse_ipv4;
use crate::parse::procfs::parse_cpuinfo_mhz;
use crate::parse::storage::{parse_lsblk_usage, parse_smartctl_temperature};
use crate::parse::sysfs::{parse_int, parse_millidegrees};
use crate::types::{CpuParameters, DriveParameters, GpuParameters, NetworkAdapter};
use crate::vendor::GpuMetric;

const CPUINFO: &str = "/proc/cpuinfo";
const NET_ROOT: &str = "/sys/class/net";
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Replace `field` with the parsed reading, keeping the old value on failure
fn replace<T>(field: &mut Field<T>, reading: Option<Result<T, InventoryError>>) {
    match reading {
        Some(Ok(value)) => field.set(value),
        Some(Err(e)) => warn!(error = %e, "reading not understood, keeping previous value"),
        None => {}
    }
}

/// Package temperature and average core clock
pub fn refresh_cpu(cpu: &mut CpuParameters, io: &Collaborators) {
    if let Some(path) = cpu.temperature_input.as_deref() {
        let reading = io.read(path).map(|text| parse_millidegrees(&text));
        replace(&mut cpu.sensors.temperature, reading);
    }
    let reading = io.read(Path::new(CPUINFO)).map(|text| parse_cpuinfo_mhz(&text));
    replace(&mut cpu.sensors.clock_mhz, reading);
}

/// Every metric the GPU's backend can read
pub fn refresh_gpu(gpu: &mut GpuParameters, io: &Collaborators) {
    let Some(backend) = gpu.backend.as_ref() else {
        return;
    };
    let sample = backend.sample(io);
    let sensors = &mut gpu.sensors;

    let updated = [
        sensors.temperature.update_with(sample.get(GpuMetric::Temperature)),
        sensors.fan_speed.update_with(sample.get(GpuMetric::FanSpeed)),
        sensors.power_draw.update_with(sample.get(GpuMetric::PowerDraw)),
        sensors.power_limit.update_with(sample.get(GpuMetric::PowerLimit)),
        sensors.core_clock.update_with(sample.get(GpuMetric::CoreClock)),
        sensors.memory_clock.update_with(sample.get(GpuMetric::MemoryClock)),
        sensors.core_voltage.update_with(sample.get(GpuMetric::CoreVoltage)),
        sensors.memory_voltage.update_with(sample.get(GpuMetric::MemoryVoltage)),
        sensors.core_clock_offset.update_with(sample.get(GpuMetric::CoreClockOffset)),
        sensors.memory_clock_offset.update_with(sample.get(GpuMetric::MemoryClockOffset)),
    ]
    .into_iter()
    .filter(|updated| *updated)
    .count();

    trace!(provider = backend.provider(), updated, "gpu sensors refreshed");
}

/// SMART temperature and filesystem usage
pub fn refresh_drive(drive: &mut DriveParameters, io: &Collaborators) {
    let Some(name) = drive.node.logical_name.non_blank().map(str::to_string) else {
        return;
    };
    let device = format!("/dev/{name}");

    // smartctl's exit status is a bitmask of health findings
    let reading = io
        .run_any_status("smartctl", &["-a", &device])
        .map(|text| parse_smartctl_temperature(&text));
    replace(&mut drive.sensors.temperature, reading);

    // `/dev/nvmeN` is a character device and lsblk rejects it
    match io
        .run("lsblk", &["-b", "-n", "-l", "-o", "NAME,FSAVAIL,FSUSED"])
        .map(|text| parse_lsblk_usage(&text, &name))
    {
        Some(Ok(usage)) => {
            drive.sensors.free_mb.set(usage.available as f64 / BYTES_PER_MB);
            drive.sensors.used_mb.set(usage.used as f64 / BYTES_PER_MB);
        }
        Some(Err(e)) => warn!(device, error = %e, "no filesystem usage"),
        None => {}
    }
}

/// Link state, link speed and IPv4 address
pub fn refresh_network(adapter: &mut NetworkAdapter, io: &Collaborators) {
    let Some(name) = adapter.node.logical_name.non_blank().map(str::to_string) else {
        return;
    };
    let dir = Path::new(NET_ROOT).join(&name);

    if let Some(state) = io.read(&dir.join("operstate")) {
        adapter.sensors.link_up.set(state.trim() == "up");
    }
    // Down links report -1
    match io.read(&dir.join("speed")).map(|text| parse_int(&text)) {
        Some(Ok(speed)) if speed >= 0 => adapter.sensors.link_speed.set(speed),
        Some(Ok(_)) => adapter.sensors.link_speed.set(0),
        Some(Err(e)) => warn!(interface = %name, error = %e, "link speed not understood"),
        None => {}
    }

    let reading = io
        .run("ip", &["-4", "-o", "addr", "show", "dev", &name])
        .map(|text| parse_ipv4(&text));
    match reading {
        Some(Ok(address)) => adapter.sensors.ip_address.set(address),
        // No address is a state, not a failure
        Some(Err(_)) => adapter.sensors.ip_address.set(String::new()),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_keeps_previous_on_failure() {
        let mut field = Field::Present(41);

        replace(&mut field, None);
        assert_eq!(field.copied(), Some(41));

        replace(&mut field, Some(Err(InventoryError::parse("x", "y"))));
        assert_eq!(field.copied(), Some(41));

        replace(&mut field, Some(Ok(43)));
        assert_eq!(field.copied(), Some(43));
    }
}
