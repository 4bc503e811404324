//! Tool Registry
//!
//! Manages registration and lookup of cluster-management tools. The registry
//! is built once at startup and frozen behind an `Arc` afterwards; a
//! duplicate tool name is a boot error, never a silent shadow.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use super::context::ToolContext;
use super::protocol::{McpError, ToolDefinition, ToolsCallResult};

// ============================================================================
// Tool Types
// ============================================================================

/// Result type for tool execution
pub type ToolResult = Result<ToolsCallResult, McpError>;

/// Boxed future for async tool execution
pub type ToolFuture = BoxFuture<'static, ToolResult>;

/// Tool handler function type
pub type ToolHandler = Arc<dyn Fn(ToolContext, Value) -> ToolFuture + Send + Sync>;

/// A registered tool with metadata and handler
pub struct RegisteredTool {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    /// Irreversible or resource-deleting operations. Hidden from discovery
    /// when the server runs in non-destructive mode; call-time dispatch does
    /// not re-check this flag.
    pub destructive: bool,
    pub handler: ToolHandler,
}

impl RegisteredTool {
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),
}

// ============================================================================
// Registry
// ============================================================================

/// Registry mapping tool name to descriptor and handler.
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register_tool(&mut self, tool: RegisteredTool) -> Result<(), RegistryError> {
        if self.tools.contains_key(&tool.name) {
            return Err(RegistryError::DuplicateTool(tool.name));
        }
        self.tools.insert(tool.name.clone(), tool);
        Ok(())
    }

    /// Discoverable tool definitions. With `non_destructive_only` set,
    /// destructive tools are filtered out. Computed fresh on every call;
    /// order is not part of the contract.
    pub fn list_tools(&self, non_destructive_only: bool) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .filter(|tool| !non_destructive_only || !tool.destructive)
            .map(RegisteredTool::definition)
            .collect()
    }

    /// Look up a tool by name.
    pub fn resolve(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Builder helpers
// ============================================================================

/// Builder for registering a tool
pub struct ToolBuilder {
    name: String,
    description: String,
    input_schema: Value,
    destructive: bool,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            destructive: false,
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn destructive(mut self) -> Self {
        self.destructive = true;
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> RegisteredTool
    where
        F: Fn(ToolContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        RegisteredTool {
            name: self.name,
            description: self.description,
            input_schema: self.input_schema,
            destructive: self.destructive,
            handler: Arc::new(move |ctx, params| Box::pin(handler(ctx, params))),
        }
    }
}
