//! Request routing for the plugin-facing HTTP surface
//!
//! Every response is JSON (except `/metrics`) and carries a permissive CORS
//! header. Routing takes the already-collected body so it can be exercised
//! without a socket.

use std::sync::Arc;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{self, HeaderValue};
use hyper::{Method, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use studio_bridge_protocol::{Ack, DeliverRequest, ErrorBody, HealthResponse, PollResponse};

use crate::observability::GaugeSnapshot;
use crate::state::SharedState;
use crate::tools::{ErrorKind, ToolError};

/// Prefix of the HTTP tool-call routes
const TOOL_PREFIX: &str = "/mcp/";

/// Route one request
pub async fn route(
    state: &Arc<SharedState>,
    method: &Method,
    path: &str,
    body: Bytes,
) -> Response<Full<Bytes>> {
    state.metrics.record_request();

    if *method == Method::OPTIONS {
        return preflight();
    }

    match (method, path) {
        (&Method::GET, "/health") => json(StatusCode::OK, &HealthResponse::default()),
        (&Method::GET, "/poll") => poll(state),
        (&Method::POST, "/response") => deliver(state, &body),
        (&Method::POST, "/ready") => ready(state),
        (&Method::GET, "/status") => json(StatusCode::OK, &state.status()),
        (&Method::GET, "/metrics") => metrics(state),
        (&Method::POST, p) if p.starts_with(TOOL_PREFIX) => {
            call_tool(state, &p[TOOL_PREFIX.len()..], &body).await
        }
        _ => not_found(),
    }
}

/// `GET /poll`: the oldest pending invocation, without claiming it
fn poll(state: &SharedState) -> Response<Full<Bytes>> {
    let body = match state.bridge.peek_oldest() {
        Some(pending) => {
            debug!(request_id = %pending.id, endpoint = %pending.endpoint, "Serving invocation to plugin");
            PollResponse::work(pending.id, pending.endpoint, pending.payload)
        }
        None => PollResponse::empty(),
    };
    state.metrics.record_poll(body.has_work());
    json(StatusCode::OK, &body)
}

/// `POST /response`: settle an invocation; always acknowledged
fn deliver(state: &SharedState, body: &Bytes) -> Response<Full<Bytes>> {
    let value: Value = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "Rejecting non-JSON response body");
                return json(StatusCode::BAD_REQUEST, &ErrorBody::new("Invalid JSON body"));
            }
        }
    };
    let delivery: DeliverRequest = serde_json::from_value(value).unwrap_or_default();

    let matched = match delivery.invocation_id() {
        Some(id) => match delivery.reported_error() {
            Some(error) => state.bridge.fail(id, error.clone()),
            None => state
                .bridge
                .complete(id, delivery.response.clone().unwrap_or(Value::Null)),
        },
        None => {
            debug!(request_id = ?delivery.request_id, "Response carried no usable request id");
            false
        }
    };
    state.metrics.record_delivery(matched);

    json(StatusCode::OK, &Ack::received())
}

/// `POST /ready`: the plugin announces itself
fn ready(state: &SharedState) -> Response<Full<Bytes>> {
    if state.plugin.mark_ready() {
        info!("Studio plugin connected");
    }
    json(StatusCode::OK, &Ack::received())
}

fn metrics(state: &SharedState) -> Response<Full<Bytes>> {
    let stats = state.bridge.stats();
    let mut gauges = GaugeSnapshot {
        pending_requests: stats.pending as u64,
        plugin_connected: state.plugin.is_connected() as u64,
        mcp_server_active: state.mcp_active() as u64,
        ..Default::default()
    };
    gauges.collect_process_metrics();

    let body = state.metrics.to_prometheus(&stats, &gauges);
    respond(
        StatusCode::OK,
        "text/plain; version=0.0.4; charset=utf-8",
        Bytes::from(body),
    )
}

/// `POST /mcp/<tool>`: run a tool on behalf of a non-MCP caller
async fn call_tool(state: &SharedState, name: &str, body: &Bytes) -> Response<Full<Bytes>> {
    state.metrics.record_tool_call();

    let args: Value = if body.is_empty() {
        Value::Object(Default::default())
    } else {
        match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => {
                let err = ToolError::InvalidArgument(format!("body is not JSON: {}", e));
                return tool_error(name, &err);
            }
        }
    };

    match state.tools.dispatch(name, &args).await {
        Ok(result) => json(StatusCode::OK, &result),
        Err(err) => tool_error(name, &err),
    }
}

fn tool_error(name: &str, err: &ToolError) -> Response<Full<Bytes>> {
    let status = match err.kind() {
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::UnknownOperation => StatusCode::NOT_FOUND,
        ErrorKind::RemoteExecution => StatusCode::BAD_GATEWAY,
        ErrorKind::TransportFailure | ErrorKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(tool = name, kind = %err.kind(), error = %err, "HTTP tool call failed");
    json(status, &ErrorBody::new(err.to_string()))
}

fn not_found() -> Response<Full<Bytes>> {
    json(StatusCode::NOT_FOUND, &ErrorBody::new("Not Found"))
}

fn preflight() -> Response<Full<Bytes>> {
    let mut response = respond(StatusCode::NO_CONTENT, "text/plain", Bytes::new());
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

pub(super) fn json<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => respond(status, "application/json", Bytes::from(bytes)),
        Err(e) => {
            warn!(error = %e, "Failed to serialize response body");
            respond(
                StatusCode::INTERNAL_SERVER_ERROR,
                "application/json",
                Bytes::from_static(br#"{"error":"Internal Server Error"}"#),
            )
        }
    }
}

fn respond(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}
