//! Configuration loading and types

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rigstate_inventory::QuirkTable;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Top-level configuration for the rigstate daemon
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Daemon server settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Scan and refresh settings
    #[serde(default)]
    pub inventory: InventoryConfig,
    /// Corrections for known-bad vendor readings
    #[serde(default)]
    pub quirks: QuirksConfig,
}

/// Daemon server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Address and port to bind to
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Timeout for each external command
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
    /// Seconds between telemetry refreshes; 0 disables the background refresh
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_scan_on_startup")]
    pub scan_on_startup: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            command_timeout_ms: default_command_timeout_ms(),
            refresh_interval_secs: default_refresh_interval_secs(),
            scan_on_startup: default_scan_on_startup(),
        }
    }
}

fn default_command_timeout_ms() -> u64 {
    10_000
}

fn default_refresh_interval_secs() -> u64 {
    5
}

fn default_scan_on_startup() -> bool {
    true
}

impl InventoryConfig {
    #[must_use]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// `None` when the background refresh is disabled
    #[must_use]
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuirksConfig {
    /// Reported compute-unit count to corrected count; TOML keys are strings
    #[serde(default = "default_compute_units")]
    pub compute_units: BTreeMap<String, u32>,
}

impl Default for QuirksConfig {
    fn default() -> Self {
        Self {
            compute_units: default_compute_units(),
        }
    }
}

fn default_compute_units() -> BTreeMap<String, u32> {
    BTreeMap::from([("14".to_string(), 36)])
}

impl QuirksConfig {
    /// Quirk table with the configured corrections; non-numeric keys are skipped
    #[must_use]
    pub fn table(&self) -> QuirkTable {
        let compute_units = self
            .compute_units
            .iter()
            .filter_map(|(reported, corrected)| match reported.trim().parse::<u32>() {
                Ok(reported) => Some((reported, *corrected)),
                Err(e) => {
                    warn!(key = %reported, error = %e, "ignoring compute unit quirk");
                    None
                }
            })
            .collect();
        QuirkTable::empty().with_compute_units(compute_units)
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// First existing config file in search order
    ///
    /// `RIGSTATE_CONFIG` wins even when it points at a missing file, so that
    /// `load` reports the mistake.
    pub fn locate() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("RIGSTATE_CONFIG") {
            return Some(PathBuf::from(path));
        }

        let mut paths = vec![
            PathBuf::from("rigstate.toml"),
            PathBuf::from("/etc/rigstate/rigstate.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("rigstate/rigstate.toml"));
        }

        paths.into_iter().find(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.daemon.bind, "127.0.0.1:8080");
        assert_eq!(config.inventory.command_timeout(), Duration::from_secs(10));
        assert_eq!(config.inventory.refresh_interval(), Some(Duration::from_secs(5)));
        assert!(config.inventory.scan_on_startup);
        assert_eq!(config.quirks.table().compute_units(14), 36);
    }

    #[test]
    fn test_full_file() {
        let config: Config = toml::from_str(
            r#"
[daemon]
bind = "0.0.0.0:9100"
log_level = "debug"
log_format = "json"

[inventory]
command_timeout_ms = 2500
refresh_interval_secs = 0
scan_on_startup = false

[quirks]
compute_units = { "14" = 14, "20" = 40, "x" = 1 }
"#,
        )
        .unwrap();

        assert_eq!(config.daemon.bind, "0.0.0.0:9100");
        assert_eq!(config.daemon.log_format, "json");
        assert_eq!(config.inventory.command_timeout(), Duration::from_millis(2500));
        assert_eq!(config.inventory.refresh_interval(), None);

        let quirks = config.quirks.table();
        assert_eq!(quirks.compute_units(14), 14);
        assert_eq!(quirks.compute_units(20), 40);
    }
}
