//! MCP (Model Context Protocol) server
//!
//! Exposes the Studio tool catalog to AI clients over JSON-RPC on stdio.

pub mod error;
pub mod protocol;
mod server;

pub use server::McpServer;
