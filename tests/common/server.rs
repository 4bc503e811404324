//! Test server lifecycle management.
//!
//! Each test gets an isolated gateway on a random port, backed by a fake
//! kubectl script so no real cluster is needed.

use std::collections::HashMap;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::net::TcpListener;

use kube_mcp_gateway::auth::{AuthError, Claims, TokenValidator};
use kube_mcp_gateway::config::Settings;
use kube_mcp_gateway::server::{make_app, ServerState};

pub const USER_TOKEN: &str = "valid-user-token";
pub const MACHINE_TOKEN: &str = "valid-machine-token";

/// Validator with hardcoded tokens, standing in for a real OIDC provider.
pub struct StaticValidator;

#[async_trait]
impl TokenValidator for StaticValidator {
    async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let sub = match token {
            USER_TOKEN => "usr_123",
            MACHINE_TOKEN => "ci-deployer",
            _ => return Err(AuthError::InvalidToken("unknown test token".to_string())),
        };
        Claims::from_raw(serde_json::json!({ "sub": sub }))
    }
}

pub struct TestServer {
    pub base_url: String,
    pub port: u16,

    _kubectl_dir: TempDir,
    server_handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

/// Write a fake kubectl/helm script that prints canned output.
fn fake_kubectl(dir: &TempDir, body: &str) -> String {
    let path = dir.path().join("kubectl");
    let mut file = std::fs::File::create(&path).expect("create fake kubectl");
    writeln!(file, "#!/bin/sh").expect("write fake kubectl");
    writeln!(file, "{body}").expect("write fake kubectl");
    drop(file);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake kubectl");
    path.to_string_lossy().into_owned()
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(&[], false, "echo 'NAME READY'; exit 0").await
    }

    pub async fn spawn_authenticated() -> Self {
        Self::spawn_with(
            &[
                ("ENABLE_AUTH", "true"),
                ("OIDC_PROVIDER_URL", "https://id.test.invalid"),
                ("OIDC_CLIENT_ID", "gateway"),
                ("OIDC_CLIENT_SECRET", "secret"),
            ],
            true,
            "echo 'NAME READY'; exit 0",
        )
        .await
    }

    /// Spawn with extra env settings and a custom fake-kubectl body.
    pub async fn spawn_with(env: &[(&str, &str)], with_validator: bool, kubectl_body: &str) -> Self {
        let kubectl_dir = tempfile::tempdir().expect("tempdir");
        let kubectl_path = fake_kubectl(&kubectl_dir, kubectl_body);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind random port");
        let port = listener.local_addr().expect("local addr").port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut env_map: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_map.insert("HOST".to_string(), "127.0.0.1".to_string());
        env_map.insert("PORT".to_string(), port.to_string());
        env_map.insert("KUBECTL_PATH".to_string(), kubectl_path.clone());
        env_map.insert("HELM_PATH".to_string(), kubectl_path);

        let settings = Settings::from_env_map(&env_map).expect("settings");
        let validator: kube_mcp_gateway::server::state::OptionalValidator = if with_validator {
            Some(Arc::new(StaticValidator))
        } else {
            None
        };
        let state = ServerState::build(settings, validator).expect("server state");

        let app = make_app(state);
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        Self {
            base_url,
            port,
            _kubectl_dir: kubectl_dir,
            server_handle,
        }
    }
}
