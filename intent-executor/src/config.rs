//! Process configuration

use group_ledger::GroupConfig;
use limit_policy::VelocityConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Executor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot file location
    pub snapshot_path: PathBuf,

    /// Periodic maintenance interval: reconcile + snapshot (seconds)
    pub save_interval_secs: u64,

    /// Pending-confirmation expiry sweep interval (seconds)
    pub sweep_interval_secs: u64,

    /// Confirmation token lifetime (seconds)
    pub confirmation_ttl_secs: i64,

    /// Actor mailbox capacity (bounded for backpressure)
    pub mailbox_capacity: usize,

    /// Per-user transaction rate limiting
    pub velocity: VelocityConfig,

    /// Defaults for groups the config provider has nothing stored for
    pub group_defaults: GroupConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("./data/ledgers.json"),
            save_interval_secs: 300,
            sweep_interval_secs: 5,
            confirmation_ttl_secs: 60,
            mailbox_capacity: 1000,
            velocity: VelocityConfig::default(),
            group_defaults: GroupConfig::default(),
        }
    }
}

impl Config {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load defaults, overridden by environment variables
    pub fn from_env() -> Self {
        let mut config = Config::default();

        if let Ok(path) = std::env::var("BENDAHARA_SNAPSHOT_PATH") {
            config.snapshot_path = PathBuf::from(path);
        }

        if let Ok(secs) = std::env::var("BENDAHARA_SAVE_INTERVAL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.save_interval_secs = secs;
            }
        }

        config
    }
}
