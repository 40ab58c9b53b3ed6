//! Inbound request/notification routing: turns a decoded method name into a
//! call on the user-supplied handler, wrapped in a tracing span that records
//! the resulting error type.

use async_trait::async_trait;
use serde_json::Value;
use tracing::Instrument;

use crate::error::RpcError;

/// Implemented once per side (`agent_side`, `client_side`) to route a
/// decoded method name to the matching trait method on the user-supplied
/// `Agent`/`Client` implementation.
#[async_trait]
pub trait Dispatch: Send + Sync {
    async fn dispatch_request(&self, method: &str, params: Value) -> Result<Value, RpcError>;
    async fn dispatch_notification(&self, method: &str, params: Value);
}

fn error_type_for_code(code: i64) -> &'static str {
    match code {
        crate::error::PARSE_ERROR => "parse_error",
        crate::error::INVALID_REQUEST => "invalid_request",
        crate::error::METHOD_NOT_FOUND => "method_not_found",
        crate::error::INVALID_PARAMS => "invalid_params",
        crate::error::AUTH_REQUIRED => "auth_required",
        _ => "internal_error",
    }
}

/// Dispatches one inbound request, wrapping the call in a span that records
/// JSON-RPC fields and the resulting error type.
pub async fn handle_request<D: Dispatch + ?Sized>(
    dispatcher: &D,
    id_key: &str,
    method: &str,
    params: Value,
) -> Result<Value, RpcError> {
    let span = tracing::info_span!(
        "acp.dispatch",
        rpc.system = "jsonrpc",
        rpc.method = %method,
        rpc.jsonrpc.request_id = %id_key,
        error.type = tracing::field::Empty,
    );
    async {
        match dispatcher.dispatch_request(method, params).await {
            Ok(result) => Ok(result),
            Err(error) => {
                tracing::Span::current().record("error.type", error_type_for_code(error.code));
                Err(error)
            }
        }
    }
    .instrument(span)
    .await
}

/// Dispatches one inbound notification. Notifications have no response to
/// report failure through, so handler errors are only logged.
pub async fn handle_notification<D: Dispatch + ?Sized>(dispatcher: &D, method: &str, params: Value) {
    let span = tracing::info_span!(
        "acp.dispatch",
        rpc.system = "jsonrpc",
        rpc.method = %method,
    );
    dispatcher
        .dispatch_notification(method, params)
        .instrument(span)
        .await;
}
