//! Host-level facts: OS identity and whole-system status

use std::path::Path;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::collab::Collaborators;
use crate::field::Field;
use crate::parse::memory::{MemoryUsage, parse_free};
use crate::parse::procfs::{parse_proc_stat, parse_uptime};
use crate::parse::sysfs::parse_millidegrees;

const HOSTNAME: &str = "/proc/sys/kernel/hostname";
const UPTIME: &str = "/proc/uptime";
const STAT: &str = "/proc/stat";
const LOAD_WINDOW: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsInfo {
    pub hostname: Field<String>,
    pub kernel: Field<String>,
}

impl OsInfo {
    #[must_use]
    pub fn collect(io: &Collaborators) -> Self {
        let mut os = Self::default();
        os.hostname
            .fill_with(io.read(Path::new(HOSTNAME)).map(|h| h.trim().to_string()));
        os.kernel
            .fill_with(io.run("uname", &["-r"]).map(|k| k.trim().to_string()));
        os
    }
}

/// Whole-system readings sampled on demand
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    /// Seconds since boot
    pub uptime: Field<f64>,
    /// Busy percentage over a short window
    pub cpu_load: Field<f64>,
    /// Degrees Celsius
    pub cpu_temperature: Field<i64>,
    pub memory: Field<MemoryUsage>,
    pub sampled_at: Option<DateTime<Utc>>,
}

impl SystemStatus {
    /// Sample uptime, load, CPU temperature and memory usage
    ///
    /// Blocks for the load window.
    #[must_use]
    pub fn sample(io: &Collaborators, cpu_sensor: Option<&Path>) -> Self {
        let mut status = Self::default();

        if let Some(text) = io.read(Path::new(UPTIME)) {
            match parse_uptime(&text) {
                Ok(uptime) => status.uptime.set(uptime),
                Err(e) => warn!(error = %e, "uptime not understood"),
            }
        }

        let stat = || {
            io.read(Path::new(STAT))
                .and_then(|text| parse_proc_stat(&text).ok())
        };
        if let Some(before) = stat() {
            thread::sleep(LOAD_WINDOW);
            if let Some(after) = stat() {
                status.cpu_load.set(after.load_since(&before));
            }
        }

        if let Some(text) = cpu_sensor.and_then(|path| io.read(path)) {
            match parse_millidegrees(&text) {
                Ok(temperature) => status.cpu_temperature.set(temperature),
                Err(e) => warn!(error = %e, "cpu temperature not understood"),
            }
        }

        if let Some(text) = io.run("free", &["--mega"]) {
            match parse_free(&text) {
                Ok(memory) => status.memory.set(memory),
                Err(e) => warn!(error = %e, "free output not understood"),
            }
        }

        status.sampled_at = Some(Utc::now());
        status
    }
}

