//! Wire envelope types for JSON-RPC 2.0 messages (spec.md §3 "Message").

use serde::Deserialize;
use serde_json::Value;

use crate::error::RpcError;

/// A fully decoded, classified inbound message.
#[derive(Debug)]
pub enum Classified {
    Request(RequestEnvelope),
    Notification(NotificationEnvelope),
    Response(ResponseEnvelope),
}

/// Classifies a raw JSON value per spec.md §4.3: `method` + `id` is a
/// request, `method` without `id` is a notification, `id` without `method`
/// is a response. Anything else is `None` (logged and dropped by the
/// caller).
pub fn classify(value: Value) -> Option<Classified> {
    let has_method = value.get("method").is_some();
    let has_id = value.get("id").is_some();

    if has_method && has_id {
        serde_json::from_value(value).ok().map(Classified::Request)
    } else if has_method {
        serde_json::from_value(value)
            .ok()
            .map(Classified::Notification)
    } else if has_id {
        serde_json::from_value(value).ok().map(Classified::Response)
    } else {
        None
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestEnvelope {
    #[allow(dead_code)]
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    #[allow(dead_code)]
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    #[allow(dead_code)]
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub id: Value,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

/// Serializes an outbound request. `id` is always a JSON number for ids this
/// crate allocates (spec.md §4.4 step 1).
pub fn encode_request(id: u64, method: &str, params: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

pub fn encode_notification(method: &str, params: Value) -> Value {
    serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
    })
}

pub fn encode_response(id: Value, result: std::result::Result<Value, RpcError>) -> Value {
    match result {
        Ok(result) => serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": result,
        }),
        Err(error) => serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": error,
        }),
    }
}

/// Canonical string form of a wire id, used as the correlation table key to
/// avoid int/string ambiguity (spec.md §3 "Correlation entry").
pub fn id_key(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
