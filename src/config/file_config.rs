//! TOML file configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration loaded from a TOML file. All fields are optional;
/// values present in the file override CLI arguments.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    /// Base URL of the Flink SQL Gateway REST endpoint.
    pub base_url: Option<String>,

    /// Timeout in seconds for individual gateway HTTP requests.
    pub request_timeout_sec: Option<u64>,
}

impl FileConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: FileConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", path))?;
        Ok(config)
    }
}
