//! Facade error types

use crate::bridge::BridgeError;

/// Failure of a named tool operation
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Arguments failed validation; no invocation was created
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// No operation with this name is registered
    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    /// The invocation was submitted but did not resolve with a result
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Arguments or result could not be converted to JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stable machine-readable error category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    UnknownOperation,
    Timeout,
    RemoteExecution,
    TransportFailure,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::UnknownOperation => "unknown_operation",
            ErrorKind::Timeout => "timeout",
            ErrorKind::RemoteExecution => "remote_execution_error",
            ErrorKind::TransportFailure => "transport_failure",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToolError {
    /// Missing, non-string or empty required argument
    pub fn missing(tool: &str, field: &str) -> Self {
        ToolError::InvalidArgument(format!("{} is required for {}", field, tool))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ToolError::UnknownOperation(_) => ErrorKind::UnknownOperation,
            ToolError::Bridge(BridgeError::Timeout { .. }) => ErrorKind::Timeout,
            ToolError::Bridge(BridgeError::RemoteExecution { .. }) => ErrorKind::RemoteExecution,
            ToolError::Bridge(BridgeError::TransportFailure(_)) => ErrorKind::TransportFailure,
            ToolError::Bridge(BridgeError::Cancelled) => ErrorKind::Cancelled,
            ToolError::Json(_) => ErrorKind::Internal,
        }
    }
}
