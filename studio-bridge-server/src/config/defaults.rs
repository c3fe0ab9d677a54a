//! Default configuration values
//!
//! Printed by `studio-bridge --help` as a starting point for a config file.

/// Default configuration as TOML
pub const DEFAULT_CONFIG_TOML: &str = r##"
# studio-bridge configuration

[bridge]
# How long a tool call waits for the Studio plugin to answer
request_timeout_ms = 30000
# How often stale requests are swept
sweep_interval_ms = 5000

[http]
# Address the Studio plugin polls; ROBLOX_STUDIO_PORT overrides the port
host = "127.0.0.1"
port = 3002

[logging]
# tracing filter; STUDIO_BRIDGE_LOG overrides
filter = "info"
# stderr | file | both
output = "stderr"
"##;
