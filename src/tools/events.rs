//! Cluster event feed.

use serde::Deserialize;
use serde_json::json;

use super::{argv, exec_error, parse_args, push_namespace};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{RegistryError, ToolBuilder, ToolRegistry};

#[derive(Debug, Deserialize)]
struct EventsParams {
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    all_namespaces: bool,
    /// Restrict to events about one object by name, e.g. `web-0`.
    #[serde(default)]
    for_object: Option<String>,
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register_tool(
        ToolBuilder::new("get_events")
            .description("Recent cluster events, newest last")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "namespace": { "type": "string" },
                    "all_namespaces": { "type": "boolean" },
                    "for_object": { "type": "string" }
                }
            }))
            .build(|ctx, args| async move {
                let params: EventsParams = parse_args(args)?;
                let mut cmd = argv(&["get", "events", "--sort-by=.lastTimestamp"]);
                push_namespace(&mut cmd, &params.namespace, params.all_namespaces);
                if let Some(object) = &params.for_object {
                    cmd.push(format!("--field-selector=involvedObject.name={object}"));
                }
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    Ok(())
}
