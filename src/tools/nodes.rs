//! Node tools.

use serde::Deserialize;
use serde_json::json;

use super::{argv, exec_error, parse_args};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{RegistryError, ToolBuilder, ToolRegistry};

#[derive(Debug, Deserialize)]
struct NodeParams {
    name: String,
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register_tool(
        ToolBuilder::new("list_nodes")
            .description("List cluster nodes with roles and versions")
            .build(|ctx, _args| async move {
                let cmd = argv(&["get", "nodes", "-o", "wide"]);
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("describe_node")
            .description("Describe a node, including capacity and conditions")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" }
                },
                "required": ["name"]
            }))
            .build(|ctx, args| async move {
                let params: NodeParams = parse_args(args)?;
                let mut cmd = argv(&["describe", "node"]);
                cmd.push(params.name.clone());
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    Ok(())
}
