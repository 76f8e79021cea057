use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub db_path: Option<String>,
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    /// Path prefixes the sync routes are mounted under, e.g. ["", "/mgaide-api"]
    pub mount_prefixes: Option<Vec<String>>,
    pub max_body_bytes: Option<usize>,

    pub db_pool: Option<DbPoolConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct DbPoolConfig {
    pub max_open_connections: Option<u32>,
    pub max_idle_connections: Option<u32>,
    pub connection_max_lifetime_secs: Option<u64>,
    pub busy_timeout_ms: Option<u64>,
    pub acquire_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
