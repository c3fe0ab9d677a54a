//! Configuration schema structs

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bridge::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_SWEEP_INTERVAL};

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bridge: BridgeConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

/// Request bridge timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// How long an invocation may wait for the plugin (default: 30000)
    pub request_timeout_ms: u64,
    /// Period of the expiry sweep (default: 5000)
    pub sweep_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL.as_millis() as u64,
        }
    }
}

impl BridgeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

/// HTTP surface polled by the Studio plugin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address (default: 127.0.0.1)
    pub host: String,
    /// Bind port; `ROBLOX_STUDIO_PORT` overrides (default: 3002)
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3002,
        }
    }
}

impl HttpConfig {
    /// `host:port`, bracketing IPv6 hosts
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Log settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing filter directive; `STUDIO_BRIDGE_LOG` overrides (default: info)
    pub filter: String,
    /// stderr, file or both (default: stderr)
    pub output: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            output: "stderr".into(),
        }
    }
}
