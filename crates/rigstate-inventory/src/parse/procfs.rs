//! `/proc` readers

use crate::error::InventoryError;
use crate::parse::{after_colon, leading_number, require};

/// Average of every `cpu MHz` line in `/proc/cpuinfo`, rounded to MHz
///
/// # Errors
///
/// Returns a parse failure when no `cpu MHz` line is present.
pub fn parse_cpuinfo_mhz(text: &str) -> Result<i64, InventoryError> {
    let clocks: Vec<f64> = text
        .lines()
        .filter(|line| line.starts_with("cpu MHz"))
        .filter_map(|line| after_colon(line).and_then(leading_number))
        .collect();

    if clocks.is_empty() {
        return Err(InventoryError::parse("/proc/cpuinfo", "no cpu MHz lines"));
    }
    let average = clocks.iter().sum::<f64>() / clocks.len() as f64;
    Ok(average.round() as i64)
}

/// Seconds since boot from `/proc/uptime`
///
/// # Errors
///
/// Returns a parse failure when the first field is not a number.
pub fn parse_uptime(text: &str) -> Result<f64, InventoryError> {
    let first = text.split_whitespace().next();
    require(first.and_then(|s| s.parse().ok()), "/proc/uptime", "missing uptime field")
}

/// Aggregate CPU time counters from the first line of `/proc/stat`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuTimes {
    /// idle + iowait jiffies
    pub idle: u64,
    /// sum of all jiffies
    pub total: u64,
}

impl CpuTimes {
    /// Busy percentage between an earlier sample and this one
    #[must_use]
    pub fn load_since(&self, earlier: &CpuTimes) -> f64 {
        let total = self.total.saturating_sub(earlier.total);
        if total == 0 {
            return 0.0;
        }
        let idle = self.idle.saturating_sub(earlier.idle);
        (total.saturating_sub(idle)) as f64 * 100.0 / total as f64
    }
}

/// Parse the aggregate `cpu` line of `/proc/stat`
///
/// # Errors
///
/// Returns a parse failure when the line is missing or too short.
pub fn parse_proc_stat(text: &str) -> Result<CpuTimes, InventoryError> {
    let line = require(
        text.lines().find(|line| line.starts_with("cpu ")),
        "/proc/stat",
        "no aggregate cpu line",
    )?;

    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map_while(|v| v.parse().ok())
        .collect();
    if values.len() < 4 {
        return Err(InventoryError::parse("/proc/stat", "cpu line has too few fields"));
    }

    let idle = values[3] + values.get(4).copied().unwrap_or(0);
    Ok(CpuTimes {
        idle,
        total: values.iter().sum(),
    })
}
