//! Namespace tools.

use serde::Deserialize;
use serde_json::json;

use super::{argv, exec_error, parse_args};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{RegistryError, ToolBuilder, ToolRegistry};

#[derive(Debug, Deserialize)]
struct NamespaceParams {
    name: String,
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register_tool(
        ToolBuilder::new("list_namespaces")
            .description("List all namespaces in the cluster")
            .build(|ctx, _args| async move {
                let cmd = argv(&["get", "namespaces"]);
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("create_namespace")
            .description("Create a namespace")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" }
                },
                "required": ["name"]
            }))
            .build(|ctx, args| async move {
                let params: NamespaceParams = parse_args(args)?;
                let mut cmd = argv(&["create", "namespace"]);
                cmd.push(params.name.clone());
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("delete_namespace")
            .description("Delete a namespace and everything in it")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" }
                },
                "required": ["name"]
            }))
            .destructive()
            .build(|ctx, args| async move {
                let params: NamespaceParams = parse_args(args)?;
                let mut cmd = argv(&["delete", "namespace"]);
                cmd.push(params.name.clone());
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    Ok(())
}
