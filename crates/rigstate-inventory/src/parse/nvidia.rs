//! Nvidia management tool output

use std::sync::LazyLock;

use regex::Regex;

use crate::error::InventoryError;
use crate::parse::{after_colon, leading_int, leading_number, require};
use crate::types::Bounds;

static SETTINGS_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"range (-?\d+) - (-?\d+)").expect("nvidia-settings range pattern is valid")
});

static SETTINGS_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\):\s*(-?\d+)\.").expect("nvidia-settings value pattern is valid")
});

/// Fields requested from `nvidia-smi --query-gpu`, in column order
pub const SMI_QUERY_FIELDS: &str = "temperature.gpu,fan.speed,power.draw,power.limit,\
power.default_limit,power.min_limit,power.max_limit,clocks.gr,clocks.mem,clocks.max.gr,clocks.max.mem";

/// One row of [`SMI_QUERY_FIELDS`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmiReadings {
    pub temperature: Option<i64>,
    pub fan_speed: Option<i64>,
    pub power_draw: Option<f64>,
    pub power_limit: Option<f64>,
    pub power_default_limit: Option<f64>,
    pub power_min_limit: Option<f64>,
    pub power_max_limit: Option<f64>,
    pub core_clock: Option<i64>,
    pub memory_clock: Option<i64>,
    pub core_clock_max: Option<i64>,
    pub memory_clock_max: Option<i64>,
}

/// Parse `nvidia-smi --query-gpu=... --format=csv,noheader,nounits`
///
/// `[N/A]` and `[Not Supported]` cells become `None`.
///
/// # Errors
///
/// Returns a parse failure when the row does not have one cell per field.
pub fn parse_smi_query(text: &str) -> Result<SmiReadings, InventoryError> {
    let row = require(
        text.lines().find(|l| !l.trim().is_empty()),
        "nvidia-smi",
        "empty output",
    )?;
    let cells: Vec<&str> = row.split(',').map(str::trim).collect();
    let expected = SMI_QUERY_FIELDS.split(',').count();
    if cells.len() != expected {
        return Err(InventoryError::parse(
            "nvidia-smi",
            format!("expected {expected} columns, got {}", cells.len()),
        ));
    }

    let float = |i: usize| -> Option<f64> {
        let cell = cells[i];
        if cell.starts_with('[') || cell.eq_ignore_ascii_case("n/a") {
            None
        } else {
            cell.parse().ok()
        }
    };
    let int = |i: usize| float(i).map(|v| v.round() as i64);

    Ok(SmiReadings {
        temperature: int(0),
        fan_speed: int(1),
        power_draw: float(2),
        power_limit: float(3),
        power_default_limit: float(4),
        power_min_limit: float(5),
        power_max_limit: float(6),
        core_clock: int(7),
        memory_clock: int(8),
        core_clock_max: int(9),
        memory_clock_max: int(10),
    })
}

/// Graphics voltage from `nvidia-smi -q -d VOLTAGE`, in mV
///
/// The value sits on the line after the `Voltage` header.
///
/// # Errors
///
/// Returns a parse failure when the section or its value is missing.
pub fn parse_smi_voltage(text: &str) -> Result<i64, InventoryError> {
    let mut lines = text.lines().map(str::trim);
    require(
        lines.by_ref().find(|line| *line == "Voltage"),
        "nvidia-smi voltage",
        "no Voltage section",
    )?;
    let value = lines
        .next()
        .and_then(after_colon)
        .and_then(leading_number)
        .map(|mv| mv.round() as i64);
    require(value, "nvidia-smi voltage", "no voltage value")
}

/// Highest usable temperature from `nvidia-smi -q -d TEMPERATURE`
///
/// Prefers `GPU Max Operating Temp`, then `GPU Slowdown Temp`.
///
/// # Errors
///
/// Returns a parse failure when neither limit is reported.
pub fn parse_smi_temperature_limit(text: &str) -> Result<i64, InventoryError> {
    let limit = |label: &str| {
        text.lines()
            .map(str::trim)
            .find(|line| line.starts_with(label))
            .and_then(after_colon)
            .and_then(leading_int)
    };
    require(
        limit("GPU Max Operating Temp").or_else(|| limit("GPU Slowdown Temp")),
        "nvidia-smi temperature",
        "no temperature limit",
    )
}

/// Valid range of an `nvidia-settings -q` attribute
///
/// # Errors
///
/// Returns a parse failure when no `range A - B` clause is present.
pub fn parse_settings_range(text: &str) -> Result<Bounds, InventoryError> {
    let caps = require(
        SETTINGS_RANGE.captures(text),
        "nvidia-settings",
        "no range clause",
    )?;
    let min = caps[1].parse().map_err(|_| InventoryError::parse("nvidia-settings", "bad range"))?;
    let max = caps[2].parse().map_err(|_| InventoryError::parse("nvidia-settings", "bad range"))?;
    Ok(Bounds { min, max })
}

/// Current value of an `nvidia-settings -q` attribute
///
/// # Errors
///
/// Returns a parse failure when the attribute line has no value.
pub fn parse_settings_value(text: &str) -> Result<i64, InventoryError> {
    let caps = require(
        SETTINGS_VALUE.captures(text),
        "nvidia-settings",
        "no attribute value",
    )?;
    caps[1]
        .parse()
        .map_err(|_| InventoryError::parse("nvidia-settings", "bad attribute value"))
}
