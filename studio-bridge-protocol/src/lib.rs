//! studio-bridge-protocol: HTTP wire definitions for the Studio plugin
//!
//! This crate defines the JSON bodies exchanged between the bridge and the
//! polling plugin, plus the correlation id type.

pub mod messages;
pub mod types;

// Re-export main types at crate root
pub use messages::{
    Ack, DeliverRequest, ErrorBody, HealthResponse, PollResponse, PolledRequest, StatusResponse,
};
pub use types::InvocationId;

/// Service name reported by `/health`
pub const SERVICE_NAME: &str = "studio-bridge";
