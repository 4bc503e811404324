use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRef;

use crate::auth::TokenValidator;
use crate::config::Settings;
use crate::kube::{ClusterClient, KubectlClient};
use crate::mcp::registry::ToolRegistry;
use crate::port_forward::PortForwardManager;

pub type GuardedSettings = Arc<Settings>;
pub type GuardedRegistry = Arc<ToolRegistry>;
pub type GuardedCluster = Arc<dyn ClusterClient>;
pub type GuardedForwards = Arc<PortForwardManager>;
pub type OptionalValidator = Option<Arc<dyn TokenValidator>>;

/// Shared state behind every transport.
#[derive(Clone)]
pub struct ServerState {
    pub settings: GuardedSettings,
    pub registry: GuardedRegistry,
    pub cluster: GuardedCluster,
    pub forwards: GuardedForwards,
    pub validator: OptionalValidator,
    pub start_time: Instant,
}

impl ServerState {
    /// Assemble state from resolved settings. The registry is populated
    /// here and frozen afterwards.
    pub fn build(
        settings: Settings,
        validator: OptionalValidator,
    ) -> Result<Self, crate::mcp::registry::RegistryError> {
        let mut registry = ToolRegistry::new();
        crate::tools::register_all_tools(&mut registry)?;

        let cluster: GuardedCluster = Arc::new(KubectlClient::new(
            settings.kubectl_path.clone(),
            settings.helm_path.clone(),
        ));
        let forwards = Arc::new(PortForwardManager::new(settings.kubectl_path.clone()));

        Ok(Self {
            settings: Arc::new(settings),
            registry: Arc::new(registry),
            cluster,
            forwards,
            validator,
            start_time: Instant::now(),
        })
    }
}

impl FromRef<ServerState> for GuardedSettings {
    fn from_ref(input: &ServerState) -> Self {
        input.settings.clone()
    }
}

impl FromRef<ServerState> for GuardedRegistry {
    fn from_ref(input: &ServerState) -> Self {
        input.registry.clone()
    }
}

impl FromRef<ServerState> for GuardedForwards {
    fn from_ref(input: &ServerState) -> Self {
        input.forwards.clone()
    }
}

/// Default state over a recording cluster fake.
#[cfg(test)]
pub async fn test_state() -> ServerState {
    use std::collections::HashMap;

    let settings = Settings::from_env_map(&HashMap::new()).expect("default settings");
    let mut registry = ToolRegistry::new();
    crate::tools::register_all_tools(&mut registry).expect("register tools");

    ServerState {
        settings: Arc::new(settings),
        registry: Arc::new(registry),
        cluster: Arc::new(crate::kube::testing::RecordingCluster::new("NAME\n")),
        forwards: Arc::new(PortForwardManager::new("kubectl")),
        validator: None,
        start_time: Instant::now(),
    }
}
