use std::path::PathBuf;
use std::time::Duration;

use tracing::trace;

use crate::Device;

/// Storage backend configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database (default for most deployments)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./fleetwatch.db")
}

/// Tuning for the two probes. Defaults mirror the classic
/// `ping -c 3 -W 1` policy and a 2 second SNMP timeout.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_ping_count")]
    pub ping_count: u32,

    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_secs: u64,

    #[serde(default = "default_snmp_timeout_secs")]
    pub snmp_timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ping_count: default_ping_count(),
            ping_timeout_secs: default_ping_timeout_secs(),
            snmp_timeout_secs: default_snmp_timeout_secs(),
        }
    }
}

impl ProbeConfig {
    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout_secs)
    }

    pub fn snmp_timeout(&self) -> Duration {
        Duration::from_secs(self.snmp_timeout_secs)
    }
}

fn default_ping_count() -> u32 {
    3
}

fn default_ping_timeout_secs() -> u64 {
    1
}

fn default_snmp_timeout_secs() -> u64 {
    2
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Seconds between fleet cycles.
    #[serde(default = "default_interval")]
    pub interval: u64,

    #[serde(default)]
    pub probe: ProbeConfig,

    /// Storage configuration (optional - defaults to SQLite)
    pub storage: Option<StorageConfig>,

    /// Device inventory for the static registry.
    #[serde(default)]
    pub devices: Vec<Device>,
}

fn default_interval() -> u64 {
    60
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|_| anyhow::anyhow!("Invalid configuration file provided!"))
        .inspect(|config: &Config| trace!("loaded config: {config:?}"))
}
