//! Port-forward session tools, backed by the session manager.

use serde::Deserialize;
use serde_json::json;

use super::parse_args;
use crate::mcp::protocol::{McpError, ToolsCallResult};
use crate::mcp::registry::{RegistryError, ToolBuilder, ToolRegistry};
use crate::port_forward::PortForwardError;

#[derive(Debug, Deserialize)]
struct StartParams {
    /// `pod`, `service`, or `deployment`.
    #[serde(default = "default_resource_type")]
    resource_type: String,
    resource_name: String,
    #[serde(default = "default_namespace")]
    namespace: String,
    local_port: u16,
    remote_port: u16,
}

fn default_resource_type() -> String {
    "pod".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

#[derive(Debug, Deserialize)]
struct StopParams {
    session_id: String,
}

fn forward_error(err: PortForwardError) -> McpError {
    match err {
        PortForwardError::SessionNotFound(id) => McpError::SessionNotFound(id),
        other => McpError::ToolExecutionFailed(other.to_string()),
    }
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register_tool(
        ToolBuilder::new("port_forward")
            .description("Start forwarding a local port to a pod, service, or deployment")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "resource_type": {
                        "type": "string",
                        "enum": ["pod", "service", "deployment"]
                    },
                    "resource_name": { "type": "string" },
                    "namespace": { "type": "string" },
                    "local_port": { "type": "integer" },
                    "remote_port": { "type": "integer" }
                },
                "required": ["resource_name", "local_port", "remote_port"]
            }))
            .build(|ctx, args| async move {
                let params: StartParams = parse_args(args)?;
                match params.resource_type.as_str() {
                    "pod" | "service" | "deployment" => {}
                    other => {
                        return Err(McpError::InvalidParams(format!(
                            "unsupported resource type: {other}"
                        )))
                    }
                }
                let info = ctx
                    .forwards
                    .start(
                        &params.resource_type,
                        &params.resource_name,
                        &params.namespace,
                        params.local_port,
                        params.remote_port,
                    )
                    .await
                    .map_err(forward_error)?;
                ToolsCallResult::json(&info).map_err(|e| McpError::InternalError(e.to_string()))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("stop_port_forward")
            .description("Stop a port-forward session by id")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "session_id": { "type": "string" }
                },
                "required": ["session_id"]
            }))
            .build(|ctx, args| async move {
                let params: StopParams = parse_args(args)?;
                let info = ctx
                    .forwards
                    .stop(&params.session_id)
                    .await
                    .map_err(forward_error)?;
                ToolsCallResult::json(&info).map_err(|e| McpError::InternalError(e.to_string()))
            }),
    )?;

    Ok(())
}
