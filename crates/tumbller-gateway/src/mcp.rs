//! Streamable HTTP transport for the MCP endpoint.
//!
//! Every client message is a `POST` carrying one JSON-RPC message; requests
//! are answered with a single `application/json` response. The server never
//! opens a stream of its own, so `GET` is refused.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tracing::{debug, info};

use crate::GatewayState;
use crate::handlers::handle_rpc;
use crate::jsonrpc::{INVALID_REQUEST, JsonRpcRequest, JsonRpcResponse, PARSE_ERROR};

/// Header carrying the session id assigned at `initialize`.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// POST /mcp — handle one JSON-RPC message.
pub async fn post_mcp(State(state): State<Arc<GatewayState>>, body: Bytes) -> Response {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            let resp = JsonRpcResponse::error(Value::Null, PARSE_ERROR, format!("Parse error: {e}"));
            return (StatusCode::BAD_REQUEST, axum::Json(resp)).into_response();
        }
    };

    // Responses to server-initiated requests carry no method; there are none
    // to match, so they are simply acknowledged.
    if message.get("method").is_none()
        && (message.get("result").is_some() || message.get("error").is_some())
    {
        return StatusCode::ACCEPTED.into_response();
    }

    let id = message.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(message) {
        Ok(req) => req,
        Err(e) => {
            let resp = JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid request: {e}"));
            return (StatusCode::BAD_REQUEST, axum::Json(resp)).into_response();
        }
    };

    if request.jsonrpc != "2.0" {
        let resp = JsonRpcResponse::error(
            id,
            INVALID_REQUEST,
            "Invalid JSON-RPC version, expected '2.0'",
        );
        return (StatusCode::BAD_REQUEST, axum::Json(resp)).into_response();
    }

    let Some(id) = request.id else {
        debug!(method = %request.method, "MCP notification");
        return StatusCode::ACCEPTED.into_response();
    };

    let response = handle_rpc(&request.method, &request.params, id, &state).await;

    let mut http = axum::Json(&response).into_response();
    if request.method == "initialize" && !response.is_error() {
        let session_id = uuid::Uuid::new_v4().to_string();
        info!(session_id = %session_id, "MCP session started");
        if let Ok(value) = HeaderValue::from_str(&session_id) {
            http.headers_mut().insert(SESSION_HEADER, value);
        }
    }
    http
}

/// GET /mcp — no server-initiated stream is offered.
pub async fn get_mcp() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST, DELETE")],
    )
        .into_response()
}

/// DELETE /mcp — client ends its session. Nothing is held per session.
pub async fn delete_mcp(headers: HeaderMap) -> StatusCode {
    if let Some(session_id) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
        info!(session_id, "MCP session closed");
    }
    StatusCode::NO_CONTENT
}
