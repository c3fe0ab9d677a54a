//! Bridge failure outcomes

use serde_json::Value;

/// Why an invocation did not resolve with a result
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BridgeError {
    /// No response within the configured deadline
    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The plugin reported a failure for this invocation
    #[error("Remote execution failed: {message}")]
    RemoteExecution {
        message: String,
        /// Error payload exactly as the plugin posted it
        details: Value,
    },

    /// The bridge itself is not accepting work
    #[error("Bridge unavailable: {0}")]
    TransportFailure(String),

    /// Settled at shutdown before any result arrived
    #[error("Request cancelled: bridge is shutting down")]
    Cancelled,
}

impl BridgeError {
    /// Build a remote failure from the plugin's error payload
    ///
    /// Strings are used verbatim, objects contribute their `message` field,
    /// anything else is rendered as JSON.
    pub fn remote(details: Value) -> Self {
        let message = match &details {
            Value::String(s) => s.clone(),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| details.to_string()),
            other => other.to_string(),
        };
        Self::RemoteExecution { message, details }
    }
}
