//! Tool invocation facade
//!
//! Validates tool arguments, forwards the call through the [`RequestBridge`]
//! to the Studio plugin and renders the plugin's answer as an MCP tool result.

pub mod catalog;
mod error;

pub use catalog::{get_tool_definitions, ToolCall};
pub use error::{ErrorKind, ToolError};

use serde_json::Value;
use tracing::debug;

use crate::bridge::RequestBridge;
use crate::mcp::protocol::ToolResult;

/// Fixed catalog of Studio operations backed by the bridge
#[derive(Clone)]
pub struct StudioTools {
    bridge: RequestBridge,
}

impl StudioTools {
    pub fn new(bridge: RequestBridge) -> Self {
        Self { bridge }
    }

    /// Parse and run a tool by name
    ///
    /// Unknown names and invalid arguments fail before the bridge is touched.
    pub async fn dispatch(&self, name: &str, args: &Value) -> Result<ToolResult, ToolError> {
        let call = ToolCall::parse(name, args)?;
        self.invoke(call).await
    }

    /// Run an already validated call and wait for the plugin's answer
    pub async fn invoke(&self, call: ToolCall) -> Result<ToolResult, ToolError> {
        let payload = call.payload()?;
        debug!(tool = call.name(), endpoint = call.endpoint(), "Dispatching tool");

        let handle = self.bridge.submit(call.endpoint(), payload)?;
        let request_id = handle.id();
        let result = handle.await?;
        debug!(tool = call.name(), request_id = %request_id, "Tool answered");

        Ok(ToolResult::text(serde_json::to_string_pretty(&result)?))
    }
}
