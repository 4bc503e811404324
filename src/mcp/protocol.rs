//! MCP Protocol Types
//!
//! Implements the Model Context Protocol message types.
//! MCP is essentially JSON-RPC 2.0 with specific method names and schemas.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol version we support
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

// ============================================================================
// Core Message Types
// ============================================================================

/// Incoming request from an MCP client.
///
/// `id` is absent for notifications, which never get a response.
#[derive(Debug, Clone, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<RequestId>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

/// Response to MCP client
#[derive(Debug, Clone, Serialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpErrorResponse>,
}

impl McpResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<RequestId>, error: McpError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Request ID can be string or number
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

/// Error response structure
#[derive(Debug, Clone, Serialize)]
pub struct McpErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Status the HTTP transport should answer with. Never serialized;
    /// the wire contract is codes only.
    #[serde(skip)]
    pub http_status: u16,
}

// ============================================================================
// Error Taxonomy
// ============================================================================

/// All the ways a request can fail, with stable wire codes.
///
/// Handler-level failures are normalized into one of these before any
/// transport sees them; raw error objects never cross the wire.
#[derive(Debug, Clone)]
pub enum McpError {
    // JSON-RPC standard errors
    ParseError(String),
    InvalidRequest(String),
    MethodNotFound(String),
    InvalidParams(String),
    InternalError(String),

    // Gateway-specific errors
    /// Dispatch target is not a registered tool. Message carries the
    /// requested name verbatim.
    UnknownTool(String),
    /// Missing or rejected bearer credential.
    Unauthorized(String),
    /// Wrong HTTP verb on the protocol endpoint.
    MethodNotAllowed,
    /// Port-forward session id is unknown or already removed.
    SessionNotFound(String),
    /// Collaborator (kubectl/helm/subprocess) failure, timeout included.
    ToolExecutionFailed(String),
}

impl McpError {
    pub fn code(&self) -> i32 {
        match self {
            McpError::ParseError(_) => -32700,
            McpError::InvalidRequest(_) => -32600,
            McpError::UnknownTool(_) => -32600,
            McpError::Unauthorized(_) => -32600,
            McpError::MethodNotFound(_) => -32601,
            McpError::InvalidParams(_) => -32602,
            McpError::InternalError(_) => -32603,
            McpError::ToolExecutionFailed(_) => -32603,
            McpError::MethodNotAllowed => -32000,
            McpError::SessionNotFound(_) => -32004,
        }
    }

    pub fn message(&self) -> String {
        match self {
            McpError::ParseError(msg) => format!("Parse error: {}", msg),
            McpError::InvalidRequest(msg) => format!("Invalid request: {}", msg),
            McpError::MethodNotFound(method) => format!("Method not found: {}", method),
            McpError::InvalidParams(msg) => format!("Invalid params: {}", msg),
            McpError::InternalError(msg) => format!("Internal error: {}", msg),
            McpError::UnknownTool(name) => format!("Unknown tool: {}", name),
            McpError::Unauthorized(detail) => format!("Unauthorized: {}", detail),
            McpError::MethodNotAllowed => "Method not allowed.".to_string(),
            McpError::SessionNotFound(id) => format!("Session not found: {}", id),
            McpError::ToolExecutionFailed(msg) => format!("Tool execution failed: {}", msg),
        }
    }

    /// Status class for the networked transport.
    pub fn http_status(&self) -> u16 {
        match self {
            McpError::Unauthorized(_) => 401,
            McpError::MethodNotAllowed => 405,
            McpError::InternalError(_) | McpError::ToolExecutionFailed(_) => 500,
            _ => 400,
        }
    }
}

impl From<McpError> for McpErrorResponse {
    fn from(err: McpError) -> Self {
        McpErrorResponse {
            code: err.code(),
            message: err.message(),
            data: None,
            http_status: err.http_status(),
        }
    }
}

// ============================================================================
// MCP Method Names
// ============================================================================

pub mod methods {
    // Lifecycle
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const SHUTDOWN: &str = "shutdown";

    // Tools
    pub const TOOLS_LIST: &str = "tools/list";
    pub const TOOLS_CALL: &str = "tools/call";

    // Ping
    pub const PING: &str = "ping";
}

// ============================================================================
// Initialize Messages
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: ClientCapabilities,
    pub client_info: ClientInfo,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct ClientCapabilities {
    #[serde(default)]
    pub roots: Option<Value>,
    #[serde(default)]
    pub sampling: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolsCapability {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

// ============================================================================
// Tools Messages
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolsCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolsCallResult {
    pub content: Vec<ToolResultContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolResultContent {
    Text { text: String },
}

impl ToolsCallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolResultContent::Text { text: text.into() }],
            is_error: None,
        }
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let text = serde_json::to_string_pretty(value)?;
        Ok(Self::text(text))
    }
}

// ============================================================================
// Ping
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PingResult {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_deserialize_string() {
        let json = r#""test-id""#;
        let id: RequestId = serde_json::from_str(json).unwrap();
        assert_eq!(id, RequestId::String("test-id".to_string()));
    }

    #[test]
    fn test_request_id_deserialize_number() {
        let json = "42";
        let id: RequestId = serde_json::from_str(json).unwrap();
        assert_eq!(id, RequestId::Number(42));
    }

    #[test]
    fn test_notification_has_no_id() {
        let req: McpRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(req.id.is_none());
    }

    #[test]
    fn test_mcp_response_success() {
        let resp = McpResponse::success(RequestId::Number(1), serde_json::json!({"ok": true}));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_mcp_response_error() {
        let resp = McpResponse::error(
            Some(RequestId::Number(1)),
            McpError::UnknownTool("frobnicate".to_string()),
        );
        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32600);
        assert_eq!(err.message, "Unknown tool: frobnicate");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(McpError::ParseError("".to_string()).code(), -32700);
        assert_eq!(McpError::InvalidRequest("".to_string()).code(), -32600);
        assert_eq!(McpError::MethodNotFound("".to_string()).code(), -32601);
        assert_eq!(McpError::InvalidParams("".to_string()).code(), -32602);
        assert_eq!(McpError::InternalError("".to_string()).code(), -32603);
        assert_eq!(McpError::UnknownTool("".to_string()).code(), -32600);
        assert_eq!(McpError::Unauthorized("".to_string()).code(), -32600);
        assert_eq!(McpError::MethodNotAllowed.code(), -32000);
        assert_eq!(McpError::SessionNotFound("".to_string()).code(), -32004);
        assert_eq!(McpError::ToolExecutionFailed("".to_string()).code(), -32603);
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(McpError::Unauthorized("no token".into()).http_status(), 401);
        assert_eq!(McpError::MethodNotAllowed.http_status(), 405);
        assert_eq!(McpError::UnknownTool("x".into()).http_status(), 400);
        assert_eq!(McpError::InvalidParams("x".into()).http_status(), 400);
        assert_eq!(McpError::SessionNotFound("x".into()).http_status(), 400);
        assert_eq!(
            McpError::ToolExecutionFailed("boom".into()).http_status(),
            500
        );
    }

    #[test]
    fn test_error_envelope_carries_status_off_wire() {
        let envelope: McpErrorResponse = McpError::MethodNotAllowed.into();
        assert_eq!(envelope.http_status, 405);
        // The status is transport metadata, never part of the JSON body
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(wire, serde_json::json!({"code": -32000, "message": "Method not allowed."}));
    }

    #[test]
    fn test_tools_call_result_text() {
        let result = ToolsCallResult::text("32 pods");
        assert_eq!(result.content.len(), 1);
        assert!(result.is_error.is_none());
    }
}
