//! MCP error types

use std::io;

use serde_json::json;

use super::protocol::JsonRpcError;
use crate::tools::ToolError;

/// MCP server errors
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// IO error (stdin/stdout)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request object is not valid JSON-RPC 2.0
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Method not found
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// Invalid parameters
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// A tool call failed
    #[error(transparent)]
    Tool(#[from] ToolError),
}

impl From<McpError> for JsonRpcError {
    fn from(err: McpError) -> Self {
        match err {
            McpError::InvalidRequest(msg) => JsonRpcError::new(JsonRpcError::INVALID_REQUEST, msg),
            McpError::MethodNotFound(method) => JsonRpcError::new(
                JsonRpcError::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            ),
            McpError::InvalidParams(msg) => JsonRpcError::new(JsonRpcError::INVALID_PARAMS, msg),
            McpError::Io(err) => {
                JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, format!("IO error: {}", err))
            }
            McpError::Json(err) => {
                JsonRpcError::new(JsonRpcError::PARSE_ERROR, format!("JSON error: {}", err))
            }
            McpError::Tool(err) => tool_error(err),
        }
    }
}

fn tool_error(err: ToolError) -> JsonRpcError {
    let kind = err.kind();
    match err {
        ToolError::InvalidArgument(msg) => JsonRpcError::with_data(
            JsonRpcError::INVALID_PARAMS,
            msg,
            json!({ "kind": kind.as_str() }),
        ),
        ToolError::UnknownOperation(name) => JsonRpcError::with_data(
            JsonRpcError::METHOD_NOT_FOUND,
            format!("Unknown tool: {}", name),
            json!({ "kind": kind.as_str() }),
        ),
        other => JsonRpcError::with_data(
            JsonRpcError::INTERNAL_ERROR,
            format!("Tool execution failed: {}", other),
            json!({ "kind": kind.as_str() }),
        ),
    }
}
