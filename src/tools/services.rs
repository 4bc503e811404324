//! Service tools.

use serde::Deserialize;
use serde_json::json;

use super::{argv, exec_error, parse_args, push_namespace};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{RegistryError, ToolBuilder, ToolRegistry};

#[derive(Debug, Deserialize)]
struct ListParams {
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    all_namespaces: bool,
}

#[derive(Debug, Deserialize)]
struct ServiceParams {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register_tool(
        ToolBuilder::new("list_services")
            .description("List services in a namespace, or across the whole cluster")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "namespace": { "type": "string" },
                    "all_namespaces": { "type": "boolean" }
                }
            }))
            .build(|ctx, args| async move {
                let params: ListParams = parse_args(args)?;
                let mut cmd = argv(&["get", "services", "-o", "wide"]);
                push_namespace(&mut cmd, &params.namespace, params.all_namespaces);
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("describe_service")
            .description("Describe a service, including endpoints")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "namespace": { "type": "string" }
                },
                "required": ["name"]
            }))
            .build(|ctx, args| async move {
                let params: ServiceParams = parse_args(args)?;
                let mut cmd = argv(&["describe", "service"]);
                cmd.push(params.name.clone());
                push_namespace(&mut cmd, &params.namespace, false);
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("delete_service")
            .description("Delete a service")
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
                let params: ServiceParams = parse_args(args)?;
                let mut cmd = argv(&["delete", "service"]);
                cmd.push(params.name.clone());
                push_namespace(&mut cmd, &params.namespace, false);
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    Ok(())
}
