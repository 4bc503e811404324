//! MCP Message Handler
//!
//! Transport-agnostic routing and dispatch for decoded protocol envelopes.
//! Both the stdio channel and the streamable HTTP endpoint feed messages
//! through [`handle_message`]; every failure leaves here normalized as an
//! [`McpError`], never as a raw error object.

use serde_json::Value;
use tracing::{debug, warn};

use super::context::ToolContext;
use super::protocol::{
    methods, InitializeParams, InitializeResult, McpError, McpRequest, McpResponse, PingResult,
    ServerCapabilities, ServerInfo, ToolsCallParams, ToolsCapability, ToolsListResult,
    MCP_PROTOCOL_VERSION,
};
use crate::auth::Principal;
use crate::server::state::ServerState;

/// Lifecycle tracking for the persistent channel. The stateless HTTP
/// transport has no session to track, so it passes `Stateless` and tool
/// methods are not gated on a prior `initialize`.
pub enum ChannelMode<'a> {
    Persistent { initialized: &'a mut bool },
    Stateless,
}

/// Handle a single protocol message. Returns `None` for notifications.
pub async fn handle_message(
    text: &str,
    state: &ServerState,
    principal: Option<Principal>,
    mut mode: ChannelMode<'_>,
) -> Option<McpResponse> {
    let request: McpRequest = match serde_json::from_str(text) {
        Ok(req) => req,
        Err(e) => {
            return Some(McpResponse::error(None, McpError::ParseError(e.to_string())));
        }
    };

    debug!("Handling MCP request: method={}", request.method);

    // Notifications carry no id and get no response.
    let request_id = match request.id.clone() {
        Some(id) => id,
        None => {
            if request.method != methods::INITIALIZED {
                debug!("Ignoring notification: {}", request.method);
            }
            return None;
        }
    };

    let ready = match &mode {
        ChannelMode::Persistent { initialized } => **initialized,
        ChannelMode::Stateless => true,
    };

    let result = match request.method.as_str() {
        methods::INITIALIZE => handle_initialize(&request, &mut mode),
        methods::PING => serde_json::to_value(PingResult {})
            .map_err(|e| McpError::InternalError(e.to_string())),
        methods::TOOLS_LIST => {
            if !ready {
                Err(McpError::InvalidRequest("Not initialized".to_string()))
            } else {
                handle_tools_list(state)
            }
        }
        methods::TOOLS_CALL => {
            if !ready {
                Err(McpError::InvalidRequest("Not initialized".to_string()))
            } else {
                handle_tools_call(&request, state, principal).await
            }
        }
        methods::SHUTDOWN => {
            // Client is disconnecting gracefully
            return None;
        }
        other => Err(McpError::MethodNotFound(other.to_string())),
    };

    Some(match result {
        Ok(value) => McpResponse::success(request_id, value),
        Err(error) => McpResponse::error(Some(request_id), error),
    })
}

fn handle_initialize(request: &McpRequest, mode: &mut ChannelMode<'_>) -> Result<Value, McpError> {
    // Client info is logged but nothing hinges on it; a missing params
    // object is tolerated the way the reference clients expect.
    let params: Option<InitializeParams> = request
        .params
        .clone()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?;

    if let Some(params) = &params {
        debug!(
            "initialize from client {} {}",
            params.client_info.name, params.client_info.version
        );
    }

    if let ChannelMode::Persistent { initialized } = mode {
        **initialized = true;
    }

    let result = InitializeResult {
        protocol_version: MCP_PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: None }),
        },
        server_info: ServerInfo {
            name: "kube-mcp-gateway".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    };

    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}

fn handle_tools_list(state: &ServerState) -> Result<Value, McpError> {
    // Recomputed from the registry every call; the non-destructive
    // restriction narrows discovery only.
    let tools = state
        .registry
        .list_tools(state.settings.allow_only_non_destructive);

    serde_json::to_value(ToolsListResult { tools })
        .map_err(|e| McpError::InternalError(e.to_string()))
}

async fn handle_tools_call(
    request: &McpRequest,
    state: &ServerState,
    principal: Option<Principal>,
) -> Result<Value, McpError> {
    let params: ToolsCallParams = request
        .params
        .clone()
        .map(serde_json::from_value)
        .transpose()
        .map_err(|e| McpError::InvalidParams(e.to_string()))?
        .ok_or_else(|| McpError::InvalidParams("Missing params".to_string()))?;

    let tool = state
        .registry
        .resolve(&params.name)
        .ok_or_else(|| McpError::UnknownTool(params.name.clone()))?;

    let ctx = ToolContext {
        cluster: state.cluster.clone(),
        forwards: state.forwards.clone(),
        settings: state.settings.clone(),
        principal,
        server_version: env!("CARGO_PKG_VERSION").to_string(),
        start_time: state.start_time,
    };

    match &ctx.principal {
        Some(principal) => debug!("Calling tool {} as {}", params.name, principal.subject),
        None => debug!("Calling tool {}", params.name),
    }

    let arguments = params.arguments.unwrap_or(serde_json::json!({}));
    let result = match (tool.handler)(ctx, arguments).await {
        Ok(result) => result,
        Err(error) => {
            warn!("Tool {} failed: {}", params.name, error.message());
            return Err(error);
        }
    };

    serde_json::to_value(result).map_err(|e| McpError::InternalError(e.to_string()))
}
