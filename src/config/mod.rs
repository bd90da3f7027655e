mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};
use std::time::Duration;

/// Environment variable selecting the gateway base URL when neither the
/// config file nor the CLI provides one.
pub const BASE_URL_ENV_VAR: &str = "SQL_GATEWAY_API_BASE_URL";

/// Fallback gateway address for local development.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8083";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub base_url: Option<String>,
    pub request_timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the Flink SQL Gateway REST endpoint, without a trailing slash.
    pub base_url: String,
    /// Timeout applied to each individual gateway HTTP request.
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present; the base URL falls back
    /// to the environment and then to the local default.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let base_url = file
            .base_url
            .or_else(|| cli.base_url.clone())
            .or_else(|| std::env::var(BASE_URL_ENV_VAR).ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            bail!("Gateway base URL resolved to an empty string");
        }

        let request_timeout_sec = file.request_timeout_sec.unwrap_or(cli.request_timeout_sec);
        if request_timeout_sec == 0 {
            bail!("request_timeout_sec must be greater than zero");
        }

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(request_timeout_sec),
        })
    }
}
