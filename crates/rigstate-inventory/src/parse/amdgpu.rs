//! amdgpu overdrive and DPM tables

use serde::{Deserialize, Serialize};

use crate::error::InventoryError;
use crate::parse::{leading_int, require};
use crate::types::Bounds;

/// One `i: <clock>MHz [<voltage>mV]` line of an overdrive section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpmState {
    pub index: u32,
    pub clock_mhz: i64,
    pub voltage_mv: Option<i64>,
}

/// Parsed `pp_od_clk_voltage`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverdriveTable {
    pub sclk: Vec<DpmState>,
    pub mclk: Vec<DpmState>,
    pub sclk_range: Option<Bounds>,
    pub mclk_range: Option<Bounds>,
    pub vddc_range: Option<Bounds>,
    pub mvdd_range: Option<Bounds>,
}

impl OverdriveTable {
    /// Highest core clock state
    #[must_use]
    pub fn top_sclk(&self) -> Option<DpmState> {
        self.sclk.iter().max_by_key(|s| s.index).copied()
    }

    /// Highest memory clock state
    #[must_use]
    pub fn top_mclk(&self) -> Option<DpmState> {
        self.mclk.iter().max_by_key(|s| s.index).copied()
    }

    /// Range for memory voltage: `MVDD` when listed, else `VDDC`
    #[must_use]
    pub fn memory_voltage_range(&self) -> Option<Bounds> {
        self.mvdd_range.or(self.vddc_range)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Sclk,
    Mclk,
    Range,
    Other,
}

/// Parse `pp_od_clk_voltage`
///
/// Sections start with `OD_` headers; unit suffixes (`MHz`, `Mhz`, `mV`) are
/// dropped. Unknown sections such as `OD_VDDGFX_OFFSET` are skipped.
///
/// # Errors
///
/// Returns a parse failure when the text has no `OD_` section at all.
pub fn parse_overdrive(text: &str) -> Result<OverdriveTable, InventoryError> {
    let mut table = OverdriveTable::default();
    let mut section = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(header) = line.strip_prefix("OD_") {
            section = Some(match header.trim_end_matches(':') {
                "SCLK" => Section::Sclk,
                "MCLK" => Section::Mclk,
                "RANGE" => Section::Range,
                _ => Section::Other,
            });
            continue;
        }

        let Some((label, values)) = line.split_once(':') else {
            continue;
        };
        let tokens: Vec<&str> = values.split_whitespace().collect();

        match section {
            Some(Section::Sclk | Section::Mclk) => {
                let (Ok(index), Some(clock_mhz)) = (
                    label.trim().parse::<u32>(),
                    tokens.first().and_then(|t| leading_int(t)),
                ) else {
                    continue;
                };
                let state = DpmState {
                    index,
                    clock_mhz,
                    voltage_mv: tokens.get(1).and_then(|t| leading_int(t)),
                };
                if section == Some(Section::Sclk) {
                    table.sclk.push(state);
                } else {
                    table.mclk.push(state);
                }
            }
            Some(Section::Range) => {
                let (Some(min), Some(max)) = (
                    tokens.first().and_then(|t| leading_int(t)),
                    tokens.get(1).and_then(|t| leading_int(t)),
                ) else {
                    continue;
                };
                let bounds = Some(Bounds { min, max });
                match label.trim() {
                    "SCLK" => table.sclk_range = bounds,
                    "MCLK" => table.mclk_range = bounds,
                    "VDDC" => table.vddc_range = bounds,
                    "MVDD" => table.mvdd_range = bounds,
                    _ => {}
                }
            }
            Some(Section::Other) => {}
            None => {}
        }
    }

    if section.is_none() {
        return Err(InventoryError::parse("pp_od_clk_voltage", "no OD_ sections"));
    }
    Ok(table)
}

/// Current clock of a `pp_dpm_sclk`/`pp_dpm_mclk` file (the `*` line)
///
/// # Errors
///
/// Returns a parse failure when no state is marked active.
pub fn parse_dpm_current(text: &str) -> Result<i64, InventoryError> {
    let line = require(
        text.lines().find(|line| line.contains('*')),
        "pp_dpm",
        "no active state",
    )?;
    let clock = line.split_whitespace().nth(1).and_then(leading_int);
    require(clock, "pp_dpm", "active state has no clock")
}
