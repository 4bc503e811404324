//! Pod tools: listing, inspection, logs, command execution, and deletion.

use serde::Deserialize;
use serde_json::json;

use super::{argv, exec_error, parse_args, push_namespace};
use crate::mcp::protocol::{McpError, ToolsCallResult};
use crate::mcp::registry::{RegistryError, ToolBuilder, ToolRegistry};

/// Default timeout for in-pod command execution.
const EXEC_DEFAULT_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Deserialize)]
struct ListPodsParams {
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    all_namespaces: bool,
    #[serde(default)]
    label_selector: Option<String>,
    #[serde(default)]
    field_selector: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PodParams {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetLogsParams {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    container: Option<String>,
    #[serde(default)]
    tail: Option<u32>,
    #[serde(default)]
    previous: bool,
    /// Window like `5m` or `2h`, passed through to kubectl.
    #[serde(default)]
    since: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExecInPodParams {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    container: Option<String>,
    /// Command as discrete argv entries; a shell string is rejected.
    command: Vec<String>,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register_tool(
        ToolBuilder::new("list_pods")
            .description("List pods in a namespace, or across the whole cluster")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "namespace": { "type": "string" },
                    "all_namespaces": { "type": "boolean" },
                    "label_selector": { "type": "string" },
                    "field_selector": { "type": "string" }
                }
            }))
            .build(|ctx, args| async move {
                let params: ListPodsParams = parse_args(args)?;
                let mut cmd = argv(&["get", "pods", "-o", "wide"]);
                push_namespace(&mut cmd, &params.namespace, params.all_namespaces);
                if let Some(selector) = &params.label_selector {
                    cmd.push("-l".to_string());
                    cmd.push(selector.clone());
                }
                if let Some(selector) = &params.field_selector {
                    cmd.push("--field-selector".to_string());
                    cmd.push(selector.clone());
                }
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("describe_pod")
            .description("Describe a pod, including events and container state")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "namespace": { "type": "string" }
                },
                "required": ["name"]
            }))
            .build(|ctx, args| async move {
                let params: PodParams = parse_args(args)?;
                let mut cmd = argv(&["describe", "pod"]);
                cmd.push(params.name.clone());
                push_namespace(&mut cmd, &params.namespace, false);
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("get_logs")
            .description("Fetch container logs from a pod")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "namespace": { "type": "string" },
                    "container": { "type": "string" },
                    "tail": { "type": "integer" },
                    "previous": { "type": "boolean" },
                    "since": { "type": "string" }
                },
                "required": ["name"]
            }))
            .build(|ctx, args| async move {
                let params: GetLogsParams = parse_args(args)?;
                let mut cmd = argv(&["logs"]);
                cmd.push(params.name.clone());
                push_namespace(&mut cmd, &params.namespace, false);
                if let Some(container) = &params.container {
                    cmd.push("-c".to_string());
                    cmd.push(container.clone());
                }
                if let Some(tail) = params.tail {
                    cmd.push("--tail".to_string());
                    cmd.push(tail.to_string());
                }
                if params.previous {
                    cmd.push("--previous".to_string());
                }
                if let Some(since) = &params.since {
                    cmd.push("--since".to_string());
                    cmd.push(since.clone());
                }
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("exec_in_pod")
            .description("Run a command inside a pod container and return its output")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "namespace": { "type": "string" },
                    "container": { "type": "string" },
                    "command": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Command and arguments as separate entries"
                    },
                    "timeout_ms": { "type": "integer" }
                },
                "required": ["name", "command"]
            }))
            .build(|ctx, args| async move {
                let params: ExecInPodParams = parse_args(args)?;
                if params.command.is_empty() {
                    return Err(McpError::InvalidParams(
                        "command must be a non-empty array".to_string(),
                    ));
                }
                let mut cmd = argv(&["exec"]);
                cmd.push(params.name.clone());
                push_namespace(&mut cmd, &params.namespace, false);
                if let Some(container) = &params.container {
                    cmd.push("-c".to_string());
                    cmd.push(container.clone());
                }
                cmd.push("--".to_string());
                cmd.extend(params.command.iter().cloned());

                let timeout = params.timeout_ms.unwrap_or(EXEC_DEFAULT_TIMEOUT_MS);
                let out = ctx
                    .cluster
                    .kubectl(&cmd, Some(timeout))
                    .await
                    .map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("delete_pod")
            .description("Delete a pod")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "namespace": { "type": "string" }
                },
                "required": ["name"]
            }))
            .destructive()
            .build(|ctx, args| async move {
                let params: PodParams = parse_args(args)?;
                let mut cmd = argv(&["delete", "pod"]);
                cmd.push(params.name.clone());
                push_namespace(&mut cmd, &params.namespace, false);
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    Ok(())
}
