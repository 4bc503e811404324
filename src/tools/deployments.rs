//! Deployment tools: listing, inspection, scaling, and deletion.

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
    #[serde(default)]
    label_selector: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeploymentParams {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScaleParams {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
    replicas: u32,
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register_tool(
        ToolBuilder::new("list_deployments")
            .description("List deployments in a namespace, or across the whole cluster")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "namespace": { "type": "string" },
                    "all_namespaces": { "type": "boolean" },
                    "label_selector": { "type": "string" }
                }
            }))
            .build(|ctx, args| async move {
                let params: ListParams = parse_args(args)?;
                let mut cmd = argv(&["get", "deployments", "-o", "wide"]);
                push_namespace(&mut cmd, &params.namespace, params.all_namespaces);
                if let Some(selector) = &params.label_selector {
                    cmd.push("-l".to_string());
                    cmd.push(selector.clone());
                }
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("describe_deployment")
            .description("Describe a deployment, including rollout state")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "namespace": { "type": "string" }
                },
                "required": ["name"]
            }))
            .build(|ctx, args| async move {
                let params: DeploymentParams = parse_args(args)?;
                let mut cmd = argv(&["describe", "deployment"]);
                cmd.push(params.name.clone());
                push_namespace(&mut cmd, &params.namespace, false);
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("scale_deployment")
            .description("Scale a deployment to a given replica count")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "namespace": { "type": "string" },
                    "replicas": { "type": "integer", "minimum": 0 }
                },
                "required": ["name", "replicas"]
            }))
            .build(|ctx, args| async move {
                let params: ScaleParams = parse_args(args)?;
                let mut cmd = argv(&["scale", "deployment"]);
                cmd.push(params.name.clone());
                cmd.push(format!("--replicas={}", params.replicas));
                push_namespace(&mut cmd, &params.namespace, false);
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("delete_deployment")
            .description("Delete a deployment and its replica sets")
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
                let params: DeploymentParams = parse_args(args)?;
                let mut cmd = argv(&["delete", "deployment"]);
                cmd.push(params.name.clone());
                push_namespace(&mut cmd, &params.namespace, false);
                let out = ctx.cluster.kubectl(&cmd, None).await.map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    Ok(())
}
