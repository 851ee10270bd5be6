// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::hasher::pool::{default_capacity, DEFAULT_MAX_BUFFER_SIZE};
use crate::map::DEFAULT_SHARDS;

pub const PROD: &str = "prod";
pub const DEV: &str = "dev";
pub const DEBUG: &str = "debug";
pub const TEST: &str = "test";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(rename = "safemap")]
    pub safemap: SettingsBox,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SettingsBox {
    pub env: String,
    pub logs: Option<Logs>,
    pub map: Option<Map>,
    pub pool: Option<Pool>,
    pub stress: Option<Stress>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Map {
    /// Values of zero or below fall back to the default shard count.
    #[serde(default = "default_shards")]
    pub shards: i64,
}

fn default_shards() -> i64 {
    DEFAULT_SHARDS as i64
}

impl Default for Map {
    fn default() -> Self {
        Self {
            shards: default_shards(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Pool {
    pub capacity: Option<usize>,
    #[serde(rename = "max_buffer_size", default = "default_max_buffer_size")]
    pub max_buffer_size: usize,
}

fn default_max_buffer_size() -> usize {
    DEFAULT_MAX_BUFFER_SIZE
}

impl Pool {
    /// Idle buffer capacity, sized by core count when unset.
    pub fn capacity(&self) -> usize {
        self.capacity.filter(|&c| c > 0).unwrap_or_else(default_capacity)
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self {
            capacity: None,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Stress {
    pub workers: usize,
    #[serde(rename = "ops_per_worker")]
    pub ops_per_worker: usize,
}

impl Default for Stress {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            ops_per_worker: 10_000,
        }
    }
}

// Config trait
pub trait ConfigTrait {
    fn logs(&self) -> Option<&Logs>;
    fn is_prod(&self) -> bool;
    fn is_debug(&self) -> bool;
    fn is_dev(&self) -> bool;
    fn is_test(&self) -> bool;
    fn map(&self) -> Map;
    fn pool(&self) -> Pool;
    fn stress(&self) -> Stress;
}

// Config type alias for convenience
pub type Config = Settings;

impl ConfigTrait for Config {
    fn logs(&self) -> Option<&Logs> {
        self.safemap.logs.as_ref()
    }

    fn is_prod(&self) -> bool {
        self.safemap.env == PROD
    }

    fn is_debug(&self) -> bool {
        self.safemap.env == DEBUG
    }

    fn is_dev(&self) -> bool {
        self.safemap.env == DEV
    }

    fn is_test(&self) -> bool {
        self.safemap.env == TEST
    }

    fn map(&self) -> Map {
        self.safemap.map.clone().unwrap_or_default()
    }

    fn pool(&self) -> Pool {
        self.safemap.pool.clone().unwrap_or_default()
    }

    fn stress(&self) -> Stress {
        self.safemap.stress.clone().unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            safemap: SettingsBox {
                env: DEV.to_string(),
                logs: None,
                map: None,
                pool: None,
                stress: None,
            },
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Resolve absolute path
        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        // Read file
        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        Self::from_yaml(&data).with_context(|| format!("unmarshal yaml from {:?}", abs_path))
    }

    /// Parses configuration from a YAML document.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let cfg: Settings = serde_yaml::from_str(data)?;
        if cfg.safemap.env.is_empty() {
            anyhow::bail!("safemap.env must not be empty");
        }
        Ok(cfg)
    }
}

// Test config is always available for integration tests
mod test_config;
pub use test_config::new_test_config;
