//! MCP Server implementation
//!
//! Newline-delimited JSON-RPC over any async reader/writer pair (stdin/stdout
//! in production). `tools/call` requests each run in their own task so several
//! invocations can wait on the plugin at once; every response goes through a
//! single writer task, in completion order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::error::McpError;
use super::protocol::{
    InitializeResult, JsonRpcError, JsonRpcRequest, JsonRpcResponse, ToolCallParams,
    ToolsListResult,
};
use crate::tools::{get_tool_definitions, StudioTools};

/// Request counter for log correlation within this process
static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Responses buffered ahead of the writer
const OUTBOX_CAPACITY: usize = 64;

/// MCP Server
///
/// Handles MCP protocol communication for one client connection.
pub struct McpServer {
    tools: StudioTools,
}

impl McpServer {
    pub fn new(tools: StudioTools) -> Self {
        Self { tools }
    }

    /// Run on the process stdio until stdin closes
    pub async fn run_stdio(&self) -> Result<(), McpError> {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        self.run(stdin, tokio::io::stdout()).await
    }

    /// Serve requests from `reader` until EOF
    ///
    /// Calls still in flight at EOF are abandoned; their invocations stay in
    /// the bridge until it is closed.
    pub async fn run<R, W>(&self, reader: R, writer: W) -> Result<(), McpError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<JsonRpcResponse>(OUTBOX_CAPACITY);
        let writer_task = tokio::spawn(write_responses(writer, rx));
        let mut calls = JoinSet::new();
        let mut lines = reader.lines();

        info!("MCP server starting");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.accept_line(&line, &tx, &mut calls).await;
                }
                Some(joined) = calls.join_next(), if !calls.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            error!(error = %e, "Tool call task panicked");
                        }
                    }
                }
            }
        }

        if !calls.is_empty() {
            warn!(in_flight = calls.len(), "Input closed with tool calls in flight");
        }
        calls.shutdown().await;
        drop(tx);

        match writer_task.await {
            Ok(result) => result?,
            Err(e) => error!(error = %e, "Response writer task failed"),
        }

        info!("MCP server shutting down");
        Ok(())
    }

    async fn accept_line(
        &self,
        line: &str,
        tx: &mpsc::Sender<JsonRpcResponse>,
        calls: &mut JoinSet<()>,
    ) {
        let req_id = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        debug!(req_id, raw = %line, "Received raw JSON-RPC request");

        let request = match parse_request(line) {
            Ok(request) => request,
            Err(response) => {
                warn!(req_id, error = ?response.error, "Rejected JSON-RPC input");
                send(tx, *response).await;
                return;
            }
        };

        info!(
            req_id,
            method = %request.method,
            jsonrpc_id = ?request.id,
            "Incoming JSON-RPC request"
        );

        if request.method == "tools/call" {
            let tools = self.tools.clone();
            let tx = tx.clone();
            calls.spawn(async move {
                if let Some(response) = handle_request(&tools, req_id, request).await {
                    send(&tx, response).await;
                }
            });
        } else if let Some(response) = handle_request(&self.tools, req_id, request).await {
            send(tx, response).await;
        }
    }
}

/// Decode one line, or produce the error response for it
fn parse_request(line: &str) -> Result<JsonRpcRequest, Box<JsonRpcResponse>> {
    let value: Value = serde_json::from_str(line).map_err(|e| {
        Box::new(JsonRpcResponse::error(
            Value::Null,
            JsonRpcError::new(JsonRpcError::PARSE_ERROR, e.to_string()),
        ))
    })?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = serde_json::from_value(value).map_err(|e| {
        Box::new(JsonRpcResponse::error(
            id.clone(),
            JsonRpcError::from(McpError::InvalidRequest(e.to_string())),
        ))
    })?;

    if request.jsonrpc != "2.0" {
        return Err(Box::new(JsonRpcResponse::error(
            id,
            JsonRpcError::with_data(
                JsonRpcError::INVALID_REQUEST,
                "Invalid JSON-RPC version",
                serde_json::json!({"expected": "2.0", "got": request.jsonrpc}),
            ),
        )));
    }

    Ok(request)
}

/// Handle a JSON-RPC request; notifications yield no response
async fn handle_request(
    tools: &StudioTools,
    req_id: u64,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    let start = Instant::now();
    let result = match request.method.as_str() {
        "initialize" => handle_initialize(),
        "initialized" | "notifications/initialized" => Ok(serde_json::json!({})),
        "ping" => Ok(serde_json::json!({})),
        "tools/list" => handle_tools_list(),
        "tools/call" => handle_tools_call(tools, &request.params).await,
        _ => Err(McpError::MethodNotFound(request.method.clone())),
    };
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if request.is_notification() {
        if let Err(e) = result {
            warn!(req_id, method = %request.method, error = %e, "Notification handling failed");
        } else {
            debug!(req_id, method = %request.method, "Notification handled (no response)");
        }
        return None;
    }

    Some(match result {
        Ok(value) => {
            info!(req_id, method = %request.method, elapsed_ms, "JSON-RPC request completed successfully");
            JsonRpcResponse::success(request.id, value)
        }
        Err(e) => {
            warn!(req_id, method = %request.method, elapsed_ms, error = %e, "JSON-RPC request completed with error");
            JsonRpcResponse::error(request.id, e.into())
        }
    })
}

fn handle_initialize() -> Result<Value, McpError> {
    info!("MCP client initializing");
    Ok(serde_json::to_value(InitializeResult::default())?)
}

fn handle_tools_list() -> Result<Value, McpError> {
    let result = ToolsListResult {
        tools: get_tool_definitions(),
    };
    Ok(serde_json::to_value(result)?)
}

async fn handle_tools_call(tools: &StudioTools, params: &Value) -> Result<Value, McpError> {
    let params: ToolCallParams = serde_json::from_value(params.clone())
        .map_err(|e| McpError::InvalidParams(format!("Invalid tools/call params: {}", e)))?;

    debug!(tool = %params.name, arguments = %params.arguments, "Calling tool");
    let result = tools.dispatch(&params.name, &params.arguments).await?;
    Ok(serde_json::to_value(result)?)
}

async fn send(tx: &mpsc::Sender<JsonRpcResponse>, response: JsonRpcResponse) {
    if tx.send(response).await.is_err() {
        debug!("Response writer gone; dropping response");
    }
}

async fn write_responses<W>(
    mut writer: W,
    mut rx: mpsc::Receiver<JsonRpcResponse>,
) -> Result<(), McpError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut json = serde_json::to_string(&response)?;
        debug!(raw = %json, "Sending raw JSON-RPC response");
        json.push('\n');
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
