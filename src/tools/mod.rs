//! Cluster-management tools.
//!
//! Each submodule registers a family of tools against the [`ToolRegistry`].
//! Handlers deserialize their arguments into typed parameter structs, build
//! an argv for the cluster client, and return the raw CLI output as text
//! content. They never touch the wire format beyond the call result.

pub mod deployments;
pub mod events;
pub mod helm;
pub mod namespaces;
pub mod nodes;
pub mod pods;
pub mod port_forward;
pub mod services;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::kube::ClusterError;
use crate::mcp::protocol::McpError;
use crate::mcp::registry::{RegistryError, ToolRegistry};

/// Register every tool family. Called once at startup.
pub fn register_all_tools(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    pods::register(registry)?;
    deployments::register(registry)?;
    services::register(registry)?;
    namespaces::register(registry)?;
    nodes::register(registry)?;
    events::register(registry)?;
    helm::register(registry)?;
    port_forward::register(registry)?;
    Ok(())
}

/// Deserialize tool arguments, mapping failures to invalid-params.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, McpError> {
    serde_json::from_value(args).map_err(|e| McpError::InvalidParams(e.to_string()))
}

pub(crate) fn exec_error(err: ClusterError) -> McpError {
    McpError::ToolExecutionFailed(err.to_string())
}

/// Append `-n <namespace>` or `--all-namespaces` to a kubectl argv.
pub(crate) fn push_namespace(args: &mut Vec<String>, namespace: &Option<String>, all: bool) {
    if all {
        args.push("--all-namespaces".to_string());
    } else if let Some(ns) = namespace {
        args.push("-n".to_string());
        args.push(ns.clone());
    }
}

pub(crate) fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_full_registry_has_expected_tools() {
        let mut registry = ToolRegistry::new();
        register_all_tools(&mut registry).unwrap();

        let names: HashSet<String> = registry
            .list_tools(false)
            .into_iter()
            .map(|t| t.name)
            .collect();
        for expected in [
            "list_pods",
            "describe_pod",
            "get_logs",
            "exec_in_pod",
            "delete_pod",
            "list_deployments",
            "describe_deployment",
            "scale_deployment",
            "delete_deployment",
            "list_services",
            "describe_service",
            "delete_service",
            "list_namespaces",
            "create_namespace",
            "delete_namespace",
            "list_nodes",
            "describe_node",
            "get_events",
            "install_helm_chart",
            "upgrade_helm_chart",
            "uninstall_helm_chart",
            "port_forward",
            "stop_port_forward",
        ] {
            assert!(names.contains(expected), "missing tool {expected}");
        }
    }

    #[test]
    fn test_destructive_tools_hidden_in_restricted_mode() {
        let mut registry = ToolRegistry::new();
        register_all_tools(&mut registry).unwrap();

        let restricted: HashSet<String> = registry
            .list_tools(true)
            .into_iter()
            .map(|t| t.name)
            .collect();
        for hidden in [
            "delete_pod",
            "delete_deployment",
            "delete_service",
            "delete_namespace",
            "uninstall_helm_chart",
        ] {
            assert!(!restricted.contains(hidden), "{hidden} should be hidden");
            // Restriction narrows discovery only; dispatch still resolves it
            assert!(registry.resolve(hidden).is_some());
        }
        assert!(restricted.contains("list_pods"));
    }
}
