//! HTTP message bodies exchanged with the Studio plugin
//!
//! All bodies are JSON with camelCase field names.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::types::InvocationId;

/// Body of `GET /poll`
///
/// `request` is always present (null when there is no work); `requestId`
/// only accompanies a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResponse {
    pub request: Option<PolledRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<InvocationId>,
}

impl PollResponse {
    /// Explicit "no work" answer
    pub fn empty() -> Self {
        Self {
            request: None,
            request_id: None,
        }
    }

    /// Answer carrying one pending invocation
    pub fn work(id: InvocationId, endpoint: impl Into<String>, payload: Value) -> Self {
        Self {
            request: Some(PolledRequest {
                endpoint: endpoint.into(),
                payload,
            }),
            request_id: Some(id),
        }
    }

    /// Whether this poll carried work
    pub fn has_work(&self) -> bool {
        self.request.is_some()
    }
}

/// The work item inside a [`PollResponse`]
///
/// Serialized with the arguments under both `payload` and `data`; existing
/// plugin builds read `data`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "PolledRequestWire")]
pub struct PolledRequest {
    /// Plugin-side route, e.g. `/api/place-info`
    pub endpoint: String,
    /// Operation arguments
    pub payload: Value,
}

impl Serialize for PolledRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PolledRequest", 3)?;
        state.serialize_field("endpoint", &self.endpoint)?;
        state.serialize_field("payload", &self.payload)?;
        state.serialize_field("data", &self.payload)?;
        state.end()
    }
}

#[derive(Deserialize)]
struct PolledRequestWire {
    endpoint: String,
    #[serde(default)]
    payload: Option<Value>,
    #[serde(default)]
    data: Option<Value>,
}

impl From<PolledRequestWire> for PolledRequest {
    fn from(wire: PolledRequestWire) -> Self {
        Self {
            endpoint: wire.endpoint,
            payload: wire.payload.or(wire.data).unwrap_or(Value::Null),
        }
    }
}

/// Body of `POST /response`
///
/// Every field is optional on the wire; a delivery that names no usable id
/// is still acknowledged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeliverRequest {
    /// Correlation id from the poll; kept untyped so malformed ids still parse
    pub request_id: Option<Value>,
    /// Success payload
    pub response: Option<Value>,
    /// Error payload; takes precedence over `response` when present
    pub error: Option<Value>,
}

impl DeliverRequest {
    /// Build a success delivery
    pub fn success(id: InvocationId, response: Value) -> Self {
        Self {
            request_id: Some(Value::String(id.to_string())),
            response: Some(response),
            error: None,
        }
    }

    /// Build a failure delivery
    pub fn failure(id: InvocationId, error: impl Into<Value>) -> Self {
        Self {
            request_id: Some(Value::String(id.to_string())),
            response: None,
            error: Some(error.into()),
        }
    }

    /// The correlation id, if it is a well-formed id string
    pub fn invocation_id(&self) -> Option<InvocationId> {
        self.request_id
            .as_ref()
            .and_then(Value::as_str)
            .and_then(InvocationId::parse)
    }

    /// The error payload, if one was reported
    ///
    /// null, `false`, `0` and `""` do not count as an error.
    pub fn reported_error(&self) -> Option<&Value> {
        self.error.as_ref().filter(|e| is_truthy(e))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Synchronous receipt acknowledgement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    /// The only acknowledgement the bridge sends
    pub fn received() -> Self {
        Self { success: true }
    }
}

/// Error body for failed HTTP calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            service: crate::SERVICE_NAME.into(),
        }
    }
}

/// Body of `GET /status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Set by the first `POST /ready`, never cleared
    pub plugin_connected: bool,
    /// Whether an MCP client is attached on stdio
    pub mcp_server_active: bool,
    /// Invocations currently awaiting the plugin
    pub pending_requests: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_poll_serializes_null_request() {
        let json = serde_json::to_value(PollResponse::empty()).unwrap();
        assert_eq!(json, json!({ "request": null }));
    }

    #[test]
    fn test_poll_with_work() {
        let id = InvocationId::new();
        let poll = PollResponse::work(id, "/api/place-info", json!({}));
        let json = serde_json::to_value(&poll).unwrap();

        assert_eq!(json["request"]["endpoint"], "/api/place-info");
        assert_eq!(json["request"]["payload"], json!({}));
        assert_eq!(json["request"]["data"], json!({}));
        assert_eq!(json["requestId"], id.to_string());
        assert!(poll.has_work());
    }

    #[test]
    fn test_polled_request_accepts_data_alias() {
        let req: PolledRequest =
            serde_json::from_value(json!({"endpoint": "/api/selection", "data": {"a": 1}}))
                .unwrap();
        assert_eq!(req.payload, json!({"a": 1}));
    }

    #[test]
    fn test_poll_response_reads_back_both_keys() {
        let id = InvocationId::new();
        let poll = PollResponse::work(id, "/api/class-info", json!({"className": "Part"}));
        let text = serde_json::to_string(&poll).unwrap();

        let parsed: PollResponse = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, poll);
    }

    #[test]
    fn test_deliver_request_fields() {
        let id = InvocationId::new();
        let body = json!({ "requestId": id.to_string(), "response": { "name": "MyGame" } });
        let req: DeliverRequest = serde_json::from_value(body).unwrap();

        assert_eq!(req.invocation_id(), Some(id));
        assert_eq!(req.response, Some(json!({ "name": "MyGame" })));
        assert!(req.reported_error().is_none());
    }

    #[test]
    fn test_deliver_request_tolerates_bad_ids() {
        let req: DeliverRequest = serde_json::from_value(json!({ "requestId": 17 })).unwrap();
        assert!(req.invocation_id().is_none());

        let req: DeliverRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.invocation_id().is_none());
        assert!(req.response.is_none());
    }

    #[test]
    fn test_reported_error_truthiness() {
        let id = InvocationId::new();
        assert!(DeliverRequest::failure(id, "Instance not found")
            .reported_error()
            .is_some());
        assert!(DeliverRequest::failure(id, json!({"message": "x"}))
            .reported_error()
            .is_some());
        assert!(DeliverRequest::failure(id, "").reported_error().is_none());
        assert!(DeliverRequest::failure(id, false).reported_error().is_none());

        let req: DeliverRequest =
            serde_json::from_value(json!({ "requestId": id.to_string(), "error": null })).unwrap();
        assert!(req.reported_error().is_none());
    }

    #[test]
    fn test_ack_shape() {
        assert_eq!(
            serde_json::to_value(Ack::received()).unwrap(),
            json!({ "success": true })
        );
    }

    #[test]
    fn test_status_shape() {
        let status = StatusResponse {
            plugin_connected: true,
            mcp_server_active: false,
            pending_requests: 3,
        };
        assert_eq!(
            serde_json::to_value(status).unwrap(),
            json!({ "pluginConnected": true, "mcpServerActive": false, "pendingRequests": 3 })
        );
    }

    #[test]
    fn test_health_default() {
        let health = HealthResponse::default();
        assert_eq!(health.status, "ok");
        assert_eq!(health.service, "studio-bridge");
    }
}
