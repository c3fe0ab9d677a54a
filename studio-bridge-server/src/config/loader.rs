//! Configuration loader

use std::net::IpAddr;
use std::path::Path;

use studio_bridge_utils::{config_file, LogOutput, Result, StudioError};

use super::AppConfig;

/// Environment variable overriding `http.port`
pub const PORT_ENV: &str = "ROBLOX_STUDIO_PORT";

/// Shortest accepted sweep period
const MIN_SWEEP_INTERVAL_MS: u64 = 100;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from default location
    pub fn load() -> Result<AppConfig> {
        let path = config_file();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Ok(AppConfig::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| StudioError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    /// Parse configuration from string
    pub fn parse(content: &str, path: &Path) -> Result<AppConfig> {
        toml::from_str(content).map_err(|e| StudioError::ConfigInvalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env<F>(config: &mut AppConfig, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV) {
            config.http.port = port.trim().parse().map_err(|_| {
                StudioError::config(format!("{} must be a port number, got '{}'", PORT_ENV, port))
            })?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(config: &AppConfig) -> Result<()> {
        if config.bridge.request_timeout_ms == 0 {
            return Err(StudioError::config("request_timeout_ms must be greater than 0"));
        }

        if config.bridge.sweep_interval_ms < MIN_SWEEP_INTERVAL_MS {
            return Err(StudioError::config(format!(
                "sweep_interval_ms must be at least {}",
                MIN_SWEEP_INTERVAL_MS
            )));
        }

        if config.http.port == 0 {
            return Err(StudioError::config("http.port must not be 0"));
        }

        if config.http.host != "localhost" && config.http.host.parse::<IpAddr>().is_err() {
            return Err(StudioError::config(format!(
                "http.host '{}' is not an IP address",
                config.http.host
            )));
        }

        config.logging.output.parse::<LogOutput>()?;

        Ok(())
    }

    /// Load, apply the process environment, and validate
    pub fn load_and_validate() -> Result<AppConfig> {
        let mut config = Self::load()?;
        Self::apply_env(&mut config, |key| std::env::var(key).ok())?;
        Self::validate(&config)?;
        Ok(config)
    }
}
