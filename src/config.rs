//! TOML configuration.
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! Command-line flags override values read here.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::cp::SolverConfig;
use crate::models::{machines_from_ids, Machine};
use crate::report::TimeUnit;
use crate::Result;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_PATH: &str = "shop-scheduler.toml";

/// Machines offered by the dashboard out of the box.
pub fn default_machines() -> Vec<String> {
    ["E-101", "T-301", "R-201"].map(String::from).to_vec()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub solver: SolverSettings,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Search limits for each solve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Wall-clock limit in seconds; 0 disables it.
    pub time_limit_secs: u64,
    pub node_limit: Option<u64>,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            time_limit_secs: 10,
            node_limit: None,
        }
    }
}

impl SolverSettings {
    pub fn solver_config(&self) -> SolverConfig {
        let mut config = SolverConfig {
            time_limit: None,
            node_limit: None,
        };
        if self.time_limit_secs > 0 {
            config = config.with_time_limit(Duration::from_secs(self.time_limit_secs));
        }
        if let Some(limit) = self.node_limit {
            config = config.with_node_limit(limit);
        }
        config
    }
}

/// What the dashboard form offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub machines: Vec<String>,
    /// Calendar length of one duration unit.
    pub time_unit: TimeUnit,
    pub max_jobs: usize,
    pub max_duration: i64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            machines: default_machines(),
            time_unit: TimeUnit::Hours,
            max_jobs: 5,
            max_duration: 5,
        }
    }
}

impl DashboardConfig {
    pub fn machine_list(&self) -> Vec<Machine> {
        machines_from_ids(&self.machines)
    }
}

impl Config {
    /// Reads `path`, or the default path when `None`.
    ///
    /// A missing default file yields the default configuration; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    Self::from_file(path)
                } else {
                    tracing::debug!("Config file not found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(&fs::read_to_string(path)?)?;
        tracing::debug!(
            path = %path.display(),
            host = %config.server.host,
            port = config.server.port,
            machines = config.dashboard.machines.len(),
            "Config loaded"
        );
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, toml::to_string_pretty(self)?)?;
        tracing::debug!(path = %path.display(), "Config saved");
        Ok(())
    }
}
