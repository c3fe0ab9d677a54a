//! Configuration management for studio-bridge
//!
//! Loaded once at startup from `config.toml` in the XDG config directory,
//! then overridden from the environment.

mod defaults;
mod loader;
mod schema;

pub use defaults::DEFAULT_CONFIG_TOML;
pub use loader::{ConfigLoader, PORT_ENV};
pub use schema::*;
