//! Tool Execution Context
//!
//! Provides access to gateway state for tool implementations.

use std::sync::Arc;
use std::time::Instant;

use crate::auth::Principal;
use crate::config::Settings;
use crate::kube::ClusterClient;
use crate::port_forward::PortForwardManager;

/// Context provided to tool handlers during execution
#[derive(Clone)]
pub struct ToolContext {
    /// Cluster capability (kubectl/helm runner)
    pub cluster: Arc<dyn ClusterClient>,

    /// Port-forward session manager
    pub forwards: Arc<PortForwardManager>,

    /// Gateway configuration
    pub settings: Arc<Settings>,

    /// Authenticated principal, present on networked exchanges when auth is
    /// enabled. The gate sets it once; nothing mutates it afterwards.
    pub principal: Option<Principal>,

    /// Server version info
    pub server_version: String,

    /// Server start time (for uptime calculation)
    pub start_time: Instant,
}
