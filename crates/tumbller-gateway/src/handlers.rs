//! MCP method handlers.

use serde_json::{Value, json};
use tracing::{info, warn};

use tumbller_tools::ToolError;

use crate::GatewayState;
use crate::jsonrpc::{INTERNAL_ERROR, INVALID_PARAMS, JsonRpcResponse, METHOD_NOT_FOUND};

/// Protocol revisions this server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

/// Route a JSON-RPC request to the appropriate handler.
pub async fn handle_rpc(
    method: &str,
    params: &Value,
    id: Value,
    state: &GatewayState,
) -> JsonRpcResponse {
    match method {
        "initialize" => handle_initialize(params, id, state),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => handle_tools_list(id, state),
        "tools/call" => handle_tools_call(params, id, state).await,
        _ => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {method}")),
    }
}

/// initialize — negotiate the protocol version and describe the server.
///
/// Params:
///   - protocolVersion: string (client's preferred revision)
fn handle_initialize(params: &Value, id: Value, state: &GatewayState) -> JsonRpcResponse {
    let requested = params.get("protocolVersion").and_then(|v| v.as_str());
    let version = negotiate_protocol_version(requested);

    let client = params
        .get("clientInfo")
        .and_then(|c| c.get("name"))
        .and_then(|n| n.as_str())
        .unwrap_or("unknown");
    info!(client, protocol_version = version, "MCP client initializing");

    JsonRpcResponse::success(
        id,
        json!({
            "protocolVersion": version,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": state.server_info.name,
                "version": state.server_info.version,
            },
            "instructions": state.server_info.instructions,
        }),
    )
}

/// Echo the client's revision when supported, otherwise offer the newest.
pub fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|r| SUPPORTED_PROTOCOL_VERSIONS.iter().find(|v| **v == r))
        .copied()
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

/// tools/list — advertise the fixed tool catalog.
fn handle_tools_list(id: Value, state: &GatewayState) -> JsonRpcResponse {
    JsonRpcResponse::success(
        id,
        json!({
            "tools": state.catalog.definitions(),
        }),
    )
}

/// tools/call — run one tool.
///
/// Params:
///   - name: string (required)
///   - arguments: object (optional)
async fn handle_tools_call(params: &Value, id: Value, state: &GatewayState) -> JsonRpcResponse {
    let name = match params.get("name").and_then(|v| v.as_str()) {
        Some(n) => n,
        None => return JsonRpcResponse::error(id, INVALID_PARAMS, "Missing 'name' parameter"),
    };

    let Some(tool) = state.catalog.get(name) else {
        return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Unknown tool: {name}"));
    };

    let arguments = match params.get("arguments") {
        None | Some(Value::Null) => json!({}),
        Some(args) => args.clone(),
    };

    info!(tool = %name, "Tool call");

    // Run on its own task so a client disconnect does not abort an
    // in-flight robot request.
    let handle = tokio::spawn(async move { tool.execute(arguments).await });

    match handle.await {
        Ok(Ok(value)) => JsonRpcResponse::success(id, tool_success(value)),
        Ok(Err(e)) => {
            warn!(tool = %name, error = %e, "Tool call failed");
            JsonRpcResponse::success(id, tool_failure(&e))
        }
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Tool task failed: {e}")),
    }
}

/// Successful `CallToolResult`: the value as text, plus structured content
/// when the value is an object.
pub fn tool_success(value: Value) -> Value {
    let text = value.to_string();
    let mut result = json!({
        "content": [{ "type": "text", "text": text }],
        "isError": false,
    });
    if value.is_object() {
        result["structuredContent"] = value;
    }
    result
}

/// Failed `CallToolResult`, distinguishable from success by `isError`.
pub fn tool_failure(error: &ToolError) -> Value {
    json!({
        "content": [{ "type": "text", "text": error.to_string() }],
        "isError": true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tumbller_link::LinkError;

    #[test]
    fn test_negotiate_supported_version() {
        assert_eq!(negotiate_protocol_version(Some("2025-03-26")), "2025-03-26");
        assert_eq!(negotiate_protocol_version(Some("2024-11-05")), "2024-11-05");
    }

    #[test]
    fn test_negotiate_unknown_version_offers_latest() {
        assert_eq!(negotiate_protocol_version(Some("1999-01-01")), "2025-06-18");
        assert_eq!(negotiate_protocol_version(None), "2025-06-18");
    }

    #[test]
    fn test_tool_success_with_object() {
        let result = tool_success(json!({"online": true}));
        assert_eq!(result["isError"], false);
        assert_eq!(result["structuredContent"], json!({"online": true}));
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], r#"{"online":true}"#);
    }

    #[test]
    fn test_tool_success_with_null_has_no_structured_content() {
        let result = tool_success(Value::Null);
        assert_eq!(result["isError"], false);
        assert!(result.get("structuredContent").is_none());
        assert_eq!(result["content"][0]["text"], "null");
    }

    #[test]
    fn test_tool_failure() {
        let err = ToolError::Link(LinkError::new("/sensor/ht", "robot unreachable"));
        let result = tool_failure(&err);
        assert_eq!(result["isError"], true);
        assert_eq!(
            result["content"][0]["text"],
            "robot request /sensor/ht failed: robot unreachable"
        );
    }
}
