use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Standard JSON-RPC 2.0 error code for malformed JSON.
pub const PARSE_ERROR: i64 = -32700;
/// Standard JSON-RPC 2.0 error code for a structurally invalid request.
pub const INVALID_REQUEST: i64 = -32600;
/// Standard JSON-RPC 2.0 error code for an unrecognized method.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Standard JSON-RPC 2.0 error code for params that fail to deserialize.
pub const INVALID_PARAMS: i64 = -32602;
/// Standard JSON-RPC 2.0 error code for a handler failure.
pub const INTERNAL_ERROR: i64 = -32603;
/// ACP domain error code: the agent requires authentication before this call.
pub const AUTH_REQUIRED: i64 = -32000;

/// A JSON-RPC 2.0 error object, wire-compatible in both directions.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("method not found: {method}"))
            .with_data(serde_json::json!({ "method": method }))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(INVALID_REQUEST, message)
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(INTERNAL_ERROR, message)
    }

    pub fn auth_required() -> Self {
        Self::new(AUTH_REQUIRED, "authentication required")
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rpc error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

/// Errors surfaced by the ACP engine, covering both wire-facing protocol
/// errors and local-only failures that never cross the connection.
#[derive(Debug, Error)]
pub enum Error {
    /// A structured JSON-RPC error, either received from the peer or about
    /// to be sent to it.
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// The connection's reader observed EOF or an I/O error while this call
    /// was outstanding.
    #[error("peer disconnected before response")]
    Disconnected,
    /// The call could not be serialized.
    #[error("failed to serialize message: {0}")]
    Serialize(#[source] serde_json::Error),
    /// A response arrived but could not be deserialized into the expected
    /// typed shape.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
    /// The underlying transport failed.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),
    /// `send_notification`/`send_request` was called after the connection's
    /// writer already shut down.
    #[error("connection is closed")]
    ConnectionClosed,
}

impl Error {
    /// Converts any error into the wire-facing `RpcError` to be written back
    /// to the peer as an inbound-handler's response. Local-only variants
    /// are coerced to `-32603 internal error`, per spec: "a generic failure
    /// is mapped to internal error with `data.error = <message>`".
    pub fn into_rpc_error(self) -> RpcError {
        match self {
            Error::Rpc(err) => err,
            other => RpcError::internal(other.to_string())
                .with_data(serde_json::json!({ "error": other.to_string() })),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
