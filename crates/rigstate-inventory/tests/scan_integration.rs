use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rigstate_api::{OverclockRequest, OverclockStatus};
use rigstate_exec::{CommandResult, ExecError, FileAccess, PrivilegeCheck, ProcessInvoker};
use rigstate_inventory::control::RejectionReason;
use rigstate_inventory::{
    Collaborators, Guid, InventoryScanner, Knob, OverclockOutcome, QuirkTable,
};

const LSHW: &str = r#"{
  "id": "rig", "class": "system", "description": "Desktop Computer",
  "product": "X570 AORUS ELITE (Default string)", "vendor": "Gigabyte Technology Co., Ltd.",
  "serial": "Default string", "configuration": {"boot": "normal", "family": "X570 MB"},
  "children": [
    {"id": "core", "class": "bus", "description": "Motherboard", "physid": "0", "children": [
      {"id": "firmware", "class": "memory", "description": "BIOS", "version": "F36d", "physid": "0", "size": 65536},
      {"id": "memory", "class": "memory", "description": "System Memory", "physid": "9", "size": 17179869184, "children": [
        {"id": "bank:0", "class": "memory", "description": "DIMM DDR4 Synchronous Unbuffered (Unregistered) 3200 MHz (0.3 ns)",
         "product": "F4-3200C16-8GVKB", "vendor": "G Skill Intl", "physid": "0", "serial": "00000001",
         "slot": "DIMM 0", "size": 8589934592, "width": 64, "clock": 3200000000},
        {"id": "bank:1", "class": "memory", "description": "[empty]", "physid": "1", "slot": "DIMM 1"}
      ]},
      {"id": "cache:0", "class": "memory", "description": "L1 cache", "physid": "c", "size": 524288,
       "configuration": {"level": "1"}},
      {"id": "cpu", "class": "processor", "description": "CPU", "product": "AMD Ryzen 7 5800X 8-Core Processor",
       "vendor": "Advanced Micro Devices [AMD]", "physid": "f", "businfo": "cpu@0", "slot": "AM4",
       "size": 4850000000, "capacity": 4850000000, "width": 64, "clock": 100000000,
       "configuration": {"cores": "8", "enabledcores": "8", "threads": "16"}},
      {"id": "pci", "class": "bridge", "description": "Host bridge", "physid": "100", "businfo": "pci@0000:00:00.0", "children": [
        {"id": "display", "class": "display", "description": "VGA compatible controller",
         "product": "Navi 22 [Radeon RX 6700 XT]", "vendor": "Advanced Micro Devices, Inc. [AMD/ATI]",
         "physid": "0", "businfo": "pci@0000:0b:00.0", "logicalname": "/dev/fb0", "version": "c1",
         "width": 64, "clock": 33000000, "configuration": {"driver": "amdgpu", "latency": "0"}},
        {"id": "nvme", "class": "storage", "description": "NVMe device", "product": "Samsung SSD 980 PRO 1TB",
         "vendor": "Samsung Electronics Co Ltd", "physid": "0", "businfo": "pci@0000:01:00.0",
         "logicalname": "/dev/nvme0", "serial": "ABC123", "children": [
          {"id": "namespace", "class": "disk", "description": "NVMe disk", "physid": "1",
           "logicalname": "/dev/nvme0n1", "serial": "ABC123", "configuration": {"sectorsize": "512"}, "children": [
            {"id": "volume", "class": "volume", "logicalname": "/dev/nvme0n1p1", "size": 512000}
          ]}
        ]},
        {"id": "network", "class": "network", "description": "Ethernet interface",
         "product": "RTL8125 2.5GbE Controller", "vendor": "Realtek Semiconductor Co., Ltd.",
         "physid": "0", "businfo": "pci@0000:05:00.0", "logicalname": "enp5s0",
         "serial": "a8:a1:59:00:00:01", "capacity": 2500000000,
         "configuration": {"speed": "1Gbit/s", "link": "yes"}},
        {"id": "disk", "class": "disk", "description": "ATA Disk", "product": "ST2000DM008-2FR1",
         "vendor": "Seagate", "physid": "0.0.0", "logicalname": "/dev/sda", "serial": "ZFL0ABCD",
         "size": 2000398934016, "configuration": {"sectorsize": "4096"}}
      ]}
    ]}
  ]
}"#;

const OVERDRIVE: &str = r"OD_SCLK:
0: 500Mhz
1: 2725Mhz
OD_MCLK:
0: 97Mhz
1: 1000MHz
OD_RANGE:
SCLK:     500Mhz       3150Mhz
MCLK:     674Mhz       1200Mhz
";

const CLINFO: &str = r"[OCL#0/*] CL_PLATFORM_NAME                AMD Accelerated Parallel Processing
[OCL#0/0] CL_DEVICE_NAME                  gfx1031
[OCL#0/0] CL_DEVICE_VENDOR                Advanced Micro Devices, Inc.
[OCL#0/0] CL_DRIVER_VERSION               3581.0 (HSA1.1,LC)
[OCL#0/0] CL_DEVICE_TYPE                  CL_DEVICE_TYPE_GPU
[OCL#0/0] CL_DEVICE_MAX_COMPUTE_UNITS     14
";

const SMART_NVME: &str = r"SMART/Health Information (NVMe Log 0x02)
Critical Warning:                   0x00
Temperature:                        38 Celsius
";

const SMART_ATA: &str = r"ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
194 Temperature_Celsius     0x0022   067   052   000    Old_age   Always       -       33
";

const LSBLK: &str = r"sda
sda1 1048576 2097152
nvme0n1
nvme0n1p1 3145728 1048576
nvme0n1p2
";

const CARD: &str = "/sys/class/drm/card0/device";
const HWMON: &str = "/sys/class/drm/card0/device/hwmon/hwmon3";

// Mock implementations
struct MockInvoker {
    /// Command line to (exit status, stdout)
    outputs: HashMap<String, (i32, String)>,
    calls: Mutex<Vec<String>>,
}

impl ProcessInvoker for MockInvoker {
    fn invoke(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<CommandResult, ExecError> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().unwrap().push(line.clone());

        match self.outputs.get(&line) {
            Some((status, stdout)) => Ok(CommandResult {
                status: *status,
                stdout: stdout.clone(),
                stderr: String::new(),
                duration: Duration::from_millis(1),
            }),
            None => Err(ExecError::NotFound(program.to_string())),
        }
    }

    fn invoker_type(&self) -> &'static str {
        "mock"
    }
}

#[derive(Default)]
struct MockFiles {
    contents: Mutex<HashMap<PathBuf, String>>,
    dirs: HashMap<PathBuf, Vec<String>>,
    writes: Mutex<Vec<(PathBuf, String)>>,
}

impl MockFiles {
    fn file(self, path: &str, contents: &str) -> Self {
        self.contents
            .lock()
            .unwrap()
            .insert(PathBuf::from(path), contents.to_string());
        self
    }

    fn dir(mut self, path: &str, entries: &[&str]) -> Self {
        self.dirs.insert(
            PathBuf::from(path),
            entries.iter().map(|e| (*e).to_string()).collect(),
        );
        self
    }
}

impl FileAccess for MockFiles {
    fn read_to_string(&self, path: &Path) -> Result<String, ExecError> {
        self.contents
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| ExecError::NotFound(path.display().to_string()))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), ExecError> {
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), contents.to_string()));
        self.contents
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, ExecError> {
        self.dirs
            .get(path)
            .cloned()
            .ok_or_else(|| ExecError::NotFound(path.display().to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        self.dirs.contains_key(path) || self.contents.lock().unwrap().contains_key(path)
    }
}

struct MockPrivileges(bool);

impl PrivilegeCheck for MockPrivileges {
    fn is_superuser(&self) -> bool {
        self.0
    }
}

fn rig_files() -> MockFiles {
    MockFiles::default()
        .dir("/sys/class/drm", &["card0", "renderD128"])
        .dir(CARD, &["consumer:pci:0000:0b:00.0", "hwmon"])
        .dir(&format!("{CARD}/hwmon"), &["hwmon3"])
        .dir("/sys/class/hwmon", &["hwmon0"])
        .file("/sys/class/hwmon/hwmon0/name", "k10temp\n")
        .file("/sys/class/hwmon/hwmon0/temp1_input", "45000\n")
        .file(&format!("{CARD}/pp_od_clk_voltage"), OVERDRIVE)
        .file(&format!("{CARD}/pp_dpm_sclk"), "0: 500Mhz *\n1: 2725Mhz\n")
        .file(&format!("{CARD}/pp_dpm_mclk"), "0: 97Mhz\n1: 1000Mhz *\n")
        .file(&format!("{HWMON}/power1_cap_min"), "100000000\n")
        .file(&format!("{HWMON}/power1_cap_max"), "240000000\n")
        .file(&format!("{HWMON}/power1_cap_default"), "186000000\n")
        .file(&format!("{HWMON}/power1_cap"), "186000000\n")
        .file(&format!("{HWMON}/temp1_crit"), "110000\n")
        .file(&format!("{HWMON}/temp1_input"), "52000\n")
        .file(&format!("{HWMON}/pwm1"), "128\n")
        .file(
            "/sys/bus/pci/devices/0000:0b:00.0/modalias",
            "pci:v00001002d000073DFsv00001DA2sd0000E445bc03sc00i00\n",
        )
        .file("/proc/cpuinfo", "cpu MHz\t\t: 3800.000\ncpu MHz\t\t: 4200.000\n")
        .file("/proc/sys/kernel/hostname", "rig-01\n")
        .file("/sys/class/net/enp5s0/operstate", "up\n")
        .file("/sys/class/net/enp5s0/speed", "1000\n")
}

fn collaborators(files: Arc<MockFiles>, superuser: bool) -> (Collaborators, Arc<MockInvoker>) {
    let outputs = [
        ("lshw -json", 0, LSHW),
        ("clinfo --raw", 0, CLINFO),
        // smartctl reports health findings in its exit status
        ("smartctl -a /dev/nvme0", 4, SMART_NVME),
        ("smartctl -a /dev/sda", 0, SMART_ATA),
        ("lsblk -b -n -l -o NAME,FSAVAIL,FSUSED", 0, LSBLK),
    ];
    let invoker = Arc::new(MockInvoker {
        outputs: outputs
            .into_iter()
            .map(|(line, status, stdout)| (line.to_string(), (status, stdout.to_string())))
            .collect(),
        calls: Mutex::new(Vec::new()),
    });
    let io = Collaborators::new(invoker.clone(), files, Arc::new(MockPrivileges(superuser)));
    (io, invoker)
}

fn scanner() -> (InventoryScanner, Arc<MockFiles>) {
    let files = Arc::new(rig_files());
    let (io, _) = collaborators(files.clone(), true);
    (InventoryScanner::new(io), files)
}

#[test]
fn test_unprivileged_scan_is_empty() {
    let (io, invoker) = collaborators(Arc::new(rig_files()), false);
    let inventory = InventoryScanner::new(io).scan();

    assert!(inventory.is_empty());
    assert!(inventory.cpus.is_empty());
    assert!(inventory.motherboard.is_none());
    assert!(invoker.calls.lock().unwrap().is_empty());
}

#[test]
fn test_full_scan() {
    let (scanner, _) = scanner();
    let inventory = scanner.scan();

    assert_eq!(inventory.cpus.len(), 1);
    let cpu = &inventory.cpus[0];
    assert_eq!(cpu.node.vendor.as_str(), "AMD");
    assert_eq!(cpu.cores_per_socket.copied(), Some(8));
    assert_eq!(cpu.cache.l1_kb.copied(), Some(512));
    assert_eq!(cpu.sensors.temperature.copied(), Some(45));
    assert_eq!(cpu.sensors.clock_mhz.copied(), Some(4000));

    assert_eq!(inventory.ram.len(), 1);
    assert_eq!(inventory.ram[0].total_mb.copied(), Some(8192));

    assert_eq!(inventory.drives.len(), 2);
    assert_eq!(inventory.drives[0].node.logical_name.as_str(), "nvme0");
    assert_eq!(
        inventory.drives[0].total_mb.copied(),
        Some(512_000.0 / 1024.0 / 1024.0)
    );
    assert_eq!(inventory.drives[1].node.logical_name.as_str(), "sda");
    assert_eq!(inventory.drives[1].sector_size.copied(), Some(4096));

    assert_eq!(inventory.network.len(), 1);
    assert_eq!(inventory.network[0].sensors.link_up.copied(), Some(true));
    assert_eq!(inventory.network[0].sensors.link_speed.copied(), Some(1000));

    let board = inventory.motherboard.as_ref().unwrap();
    assert_eq!(board.node.product.as_str(), "X570 AORUS ELITE");
    assert_eq!(board.bios_version.as_str(), "F36d");
    assert_eq!(inventory.os.hostname.as_str(), "rig-01");

    assert_eq!(inventory.gpus.len(), 1);
    let gpu = &inventory.gpus[0];
    assert_eq!(gpu.node.phys_id.as_str(), "0");
    assert_eq!(gpu.subvendor.as_str(), "Sapphire");
    assert_eq!(gpu.pci_ids.device.as_str(), "73df");
    assert_eq!(gpu.power_limit.max.copied(), Some(240));
    assert_eq!(gpu.core_clock.max.copied(), Some(3150));
    assert_eq!(gpu.fan.default.copied(), Some(50));
    assert_eq!(gpu.sensors.temperature.copied(), Some(52));
    assert_eq!(gpu.sensors.memory_clock.copied(), Some(1000));
    assert!(gpu.guid.is_present());
}

#[test]
fn test_out_of_range_field_rejected_rest_applied() {
    let (scanner, files) = scanner();
    let mut inventory = scanner.scan();
    let guid = inventory.gpus[0].guid.get().cloned().unwrap();

    let request = OverclockRequest {
        fan_speed: Some(60),
        core_clock_offset: Some(9000),
        ..OverclockRequest::default()
    };
    let outcome = inventory.apply_overclock(scanner.io(), &guid, &request);

    let OverclockOutcome::PartiallyApplied { applied, rejected } = outcome else {
        panic!("expected partial application");
    };
    assert_eq!(applied, [Knob::FanSpeed]);
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].knob, Knob::CoreClockOffset);
    assert_eq!(
        rejected[0].reason,
        RejectionReason::OutOfRange { min: 500, max: 3150 }
    );

    let writes = files.writes.lock().unwrap();
    assert!(writes.contains(&(PathBuf::from(format!("{HWMON}/pwm1_enable")), "1".to_string())));
    assert!(writes.contains(&(PathBuf::from(format!("{HWMON}/pwm1")), "153".to_string())));
    assert!(!writes.iter().any(|(path, _)| path.ends_with("pp_od_clk_voltage")));

    let gpu = &inventory.gpus[0];
    assert_eq!(gpu.fan.default.copied(), Some(60));
    assert_eq!(gpu.sensors.fan_speed.copied(), Some(60));
}

#[test]
fn test_core_clock_sets_top_state() {
    let (scanner, files) = scanner();
    let mut inventory = scanner.scan();
    let guid = inventory.gpus[0].guid.get().cloned().unwrap();

    let request = OverclockRequest {
        core_clock_offset: Some(2600),
        ..OverclockRequest::default()
    };
    let outcome = inventory.apply_overclock(scanner.io(), &guid, &request);
    assert_eq!(outcome.status(), OverclockStatus::Success);

    let writes = files.writes.lock().unwrap();
    let table = PathBuf::from(format!("{CARD}/pp_od_clk_voltage"));
    let commands: Vec<&str> = writes
        .iter()
        .filter(|(path, _)| *path == table)
        .map(|(_, value)| value.as_str())
        .collect();
    assert_eq!(commands, ["s 1 2600", "c"]);
}

#[test]
fn test_guids_stable_across_refresh_and_rescan() {
    let (scanner, _) = scanner();
    let mut inventory = scanner.scan();
    let before: Vec<_> = inventory.gpus.iter().map(|g| g.guid.clone()).collect();
    let drive = inventory.drives[0].guid.clone();

    inventory.refresh(scanner.io());
    let after: Vec<_> = inventory.gpus.iter().map(|g| g.guid.clone()).collect();
    assert_eq!(before, after);
    assert_eq!(drive, inventory.drives[0].guid);

    let rescan = scanner.scan();
    assert_eq!(rescan.gpus[0].guid, inventory.gpus[0].guid);
    assert_eq!(rescan.cpus[0].guid, inventory.cpus[0].guid);
}

#[test]
fn test_unknown_and_non_gpu_guids() {
    let (scanner, _) = scanner();
    let mut inventory = scanner.scan();
    let request = OverclockRequest {
        power_limit: Some(200),
        ..OverclockRequest::default()
    };

    let unknown = Guid::from("00000000-0000-0000-0000-000000000000");
    assert_eq!(
        inventory.apply_overclock(scanner.io(), &unknown, &request),
        OverclockOutcome::NotFound
    );

    let drive = inventory.drives[0].guid.get().cloned().unwrap();
    let outcome = inventory.apply_overclock(scanner.io(), &drive, &request);
    assert_eq!(outcome.status(), OverclockStatus::PartiallyApplied);
}

#[test]
fn test_dynamic_snapshot_keys_by_guid() {
    let (scanner, _) = scanner();
    let inventory = scanner.scan();
    let snapshot = inventory.dynamic_snapshot();

    let json = serde_json::to_value(&snapshot).unwrap();
    let gpu = &json["gpus"][0];
    assert_eq!(gpu["guid"], serde_json::json!(inventory.gpus[0].guid.get().unwrap()));
    assert_eq!(gpu["temperature"], 52);
    assert!(json["cpus"][0].get("node").is_none());
}

#[test]
fn test_gpu_compute_units_corrected_by_quirks() {
    let (scanner, _) = scanner();
    let gpu = &scanner.scan().gpus[0];

    assert_eq!(gpu.compute_units.copied(), Some(36));
    assert_eq!(gpu.driver_version.as_str(), "3581.0 (HSA1.1,LC)");

    let files = Arc::new(rig_files());
    let (io, _) = collaborators(files, true);
    let unquirked = InventoryScanner::new(io).with_quirks(QuirkTable::empty()).scan();
    assert_eq!(unquirked.gpus[0].compute_units.copied(), Some(14));
}

#[test]
fn test_drive_refresh_reads_smart_and_usage() {
    let files = Arc::new(rig_files());
    let (io, invoker) = collaborators(files, true);
    let scanner = InventoryScanner::new(io);
    let mut inventory = scanner.scan();

    let nvme = &inventory.drives[0];
    assert_eq!(nvme.sensors.temperature.copied(), Some(38));
    assert_eq!(nvme.sensors.free_mb.copied(), Some(3.0));
    assert_eq!(nvme.sensors.used_mb.copied(), Some(1.0));

    let sata = &inventory.drives[1];
    assert_eq!(sata.sensors.temperature.copied(), Some(33));
    assert_eq!(sata.sensors.free_mb.copied(), Some(1.0));
    assert_eq!(sata.sensors.used_mb.copied(), Some(2.0));

    inventory.drives[0].sensors.temperature.set(0);
    inventory.refresh(scanner.io());
    assert_eq!(inventory.drives[0].sensors.temperature.copied(), Some(38));

    let calls = invoker.calls.lock().unwrap();
    assert!(!calls.iter().any(|call| call.starts_with("lsblk") && call.contains("/dev/")));
}
