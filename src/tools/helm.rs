//! Helm release tools.
//!
//! Chart values are passed as individual `--set key=value` pairs so no
//! temporary values file is ever written.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::json;

use super::{argv, exec_error, parse_args};
use crate::mcp::protocol::ToolsCallResult;
use crate::mcp::registry::{RegistryError, ToolBuilder, ToolRegistry};

/// Helm operations can pull charts over the network, so they get a longer
/// leash than kubectl calls.
const HELM_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Deserialize)]
struct InstallParams {
    release: String,
    chart: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    repo: Option<String>,
    /// Flattened chart values; nested keys use dotted paths.
    #[serde(default)]
    values: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct UninstallParams {
    release: String,
    #[serde(default)]
    namespace: Option<String>,
}

fn push_common(cmd: &mut Vec<String>, namespace: &Option<String>, repo: &Option<String>) {
    if let Some(ns) = namespace {
        cmd.push("-n".to_string());
        cmd.push(ns.clone());
    }
    if let Some(repo) = repo {
        cmd.push("--repo".to_string());
        cmd.push(repo.clone());
    }
}

fn push_values(cmd: &mut Vec<String>, values: &BTreeMap<String, String>) {
    for (key, value) in values {
        cmd.push("--set".to_string());
        cmd.push(format!("{key}={value}"));
    }
}

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    registry.register_tool(
        ToolBuilder::new("install_helm_chart")
            .description("Install a Helm chart as a new release")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "release": { "type": "string" },
                    "chart": { "type": "string" },
                    "namespace": { "type": "string" },
                    "repo": { "type": "string" },
                    "values": {
                        "type": "object",
                        "additionalProperties": { "type": "string" }
                    }
                },
                "required": ["release", "chart"]
            }))
            .build(|ctx, args| async move {
                let params: InstallParams = parse_args(args)?;
                let mut cmd = argv(&["install"]);
                cmd.push(params.release.clone());
                cmd.push(params.chart.clone());
                push_common(&mut cmd, &params.namespace, &params.repo);
                if params.namespace.is_some() {
                    cmd.push("--create-namespace".to_string());
                }
                push_values(&mut cmd, &params.values);
                let out = ctx
                    .cluster
                    .helm(&cmd, Some(HELM_TIMEOUT_MS))
                    .await
                    .map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("upgrade_helm_chart")
            .description("Upgrade an existing Helm release, installing if absent")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "release": { "type": "string" },
                    "chart": { "type": "string" },
                    "namespace": { "type": "string" },
                    "repo": { "type": "string" },
                    "values": {
                        "type": "object",
                        "additionalProperties": { "type": "string" }
                    }
                },
                "required": ["release", "chart"]
            }))
            .build(|ctx, args| async move {
                let params: InstallParams = parse_args(args)?;
                let mut cmd = argv(&["upgrade", "--install"]);
                cmd.push(params.release.clone());
                cmd.push(params.chart.clone());
                push_common(&mut cmd, &params.namespace, &params.repo);
                push_values(&mut cmd, &params.values);
                let out = ctx
                    .cluster
                    .helm(&cmd, Some(HELM_TIMEOUT_MS))
                    .await
                    .map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    registry.register_tool(
        ToolBuilder::new("uninstall_helm_chart")
            .description("Uninstall a Helm release")
            .input_schema(json!({
                "type": "object",
                "properties": {
                    "release": { "type": "string" },
                    "namespace": { "type": "string" }
                },
                "required": ["release"]
            }))
            .destructive()
            .build(|ctx, args| async move {
                let params: UninstallParams = parse_args(args)?;
                let mut cmd = argv(&["uninstall"]);
                cmd.push(params.release.clone());
                if let Some(ns) = &params.namespace {
                    cmd.push("-n".to_string());
                    cmd.push(ns.clone());
                }
                let out = ctx
                    .cluster
                    .helm(&cmd, Some(HELM_TIMEOUT_MS))
                    .await
                    .map_err(exec_error)?;
                Ok(ToolsCallResult::text(out))
            }),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kube::testing::RecordingCluster;
    use crate::tools::test_support::context_with;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_install_builds_set_flags_in_stable_order() {
        let mut registry = ToolRegistry::new();
        register(&mut registry).unwrap();
        let cluster = Arc::new(RecordingCluster::new("STATUS: deployed\n"));
        let tool = registry.resolve("install_helm_chart").unwrap();
        (tool.handler)(
            context_with(cluster.clone()),
            json!({
                "release": "web",
                "chart": "bitnami/nginx",
                "namespace": "apps",
                "values": {"replicaCount": "2", "image.tag": "1.27"}
            }),
        )
        .await
        .unwrap();
        let call = cluster.last_call();
        assert_eq!(call.program, "helm");
        assert_eq!(
            call.args,
            vec![
                "install",
                "web",
                "bitnami/nginx",
                "-n",
                "apps",
                "--create-namespace",
                "--set",
                "image.tag=1.27",
                "--set",
                "replicaCount=2"
            ]
        );
    }

    #[tokio::test]
    async fn test_upgrade_uses_install_fallback() {
        let mut registry = ToolRegistry::new();
        register(&mut registry).unwrap();
        let cluster = Arc::new(RecordingCluster::new(""));
        let tool = registry.resolve("upgrade_helm_chart").unwrap();
        (tool.handler)(
            context_with(cluster.clone()),
            json!({"release": "web", "chart": "bitnami/nginx"}),
        )
        .await
        .unwrap();
        assert_eq!(
            cluster.last_call().args,
            vec!["upgrade", "--install", "web", "bitnami/nginx"]
        );
    }
}
