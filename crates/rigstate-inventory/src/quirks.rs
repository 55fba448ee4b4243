//! Corrections for known-bad vendor readings

use std::collections::BTreeMap;

/// Override table keyed by the observed (wrong) value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuirkTable {
    compute_units: BTreeMap<u32, u32>,
}

impl Default for QuirkTable {
    fn default() -> Self {
        // FIXME: keyed by the reported count alone, so any device that
        // legitimately has 14 units is remapped too. Key it by PCI device id
        // once compute devices are matched to GPU records.
        Self {
            compute_units: BTreeMap::from([(14, 36)]),
        }
    }
}

impl QuirkTable {
    /// A table with no corrections
    #[must_use]
    pub fn empty() -> Self {
        Self {
            compute_units: BTreeMap::new(),
        }
    }

    /// Replace the compute-unit corrections
    #[must_use]
    pub fn with_compute_units(mut self, table: BTreeMap<u32, u32>) -> Self {
        self.compute_units = table;
        self
    }

    /// Corrected compute-unit count for a reported one
    #[must_use]
    pub fn compute_units(&self, reported: u32) -> u32 {
        self.compute_units.get(&reported).copied().unwrap_or(reported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_remap() {
        let quirks = QuirkTable::default();
        assert_eq!(quirks.compute_units(14), 36);
        assert_eq!(quirks.compute_units(40), 40);
    }

    #[test]
    fn test_configured_table() {
        let quirks = QuirkTable::empty().with_compute_units(BTreeMap::from([(8, 16)]));
        assert_eq!(quirks.compute_units(14), 14);
        assert_eq!(quirks.compute_units(8), 16);
    }
}
