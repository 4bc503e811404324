//! Gateway configuration.
//!
//! Every knob is an environment variable, resolved once at startup into an
//! immutable [`Settings`] value. Boolean variables are opt-in: only the
//! literal string `true` enables them, anything else (including unset)
//! means disabled.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ALLOWED_HOST: &str = "127.0.0.1";
pub const DEFAULT_KUBECTL_PATH: &str = "kubectl";
pub const DEFAULT_HELM_PATH: &str = "helm";

/// Resolved gateway configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Bind host for the HTTP transport.
    pub host: String,
    /// Bind port for the HTTP transport.
    pub port: u16,
    /// Serve the streamable HTTP transport instead of stdio.
    pub http_transport: bool,
    /// Require bearer-token authentication on protocol endpoints.
    pub auth_enabled: bool,
    /// Hide destructive tools from `tools/list`.
    pub allow_only_non_destructive: bool,
    /// Reject requests whose Host header is not the allowed host.
    pub dns_rebinding_protection: bool,
    /// Host value accepted when rebinding protection is on.
    pub dns_rebinding_allowed_host: String,

    pub oidc: OidcSettings,
    pub oauth_metadata: OauthMetadataSettings,

    /// Path to the kubectl binary.
    pub kubectl_path: String,
    /// Path to the helm binary.
    pub helm_path: String,
}

/// OIDC provider coordinates, required when auth is enabled.
#[derive(Debug, Clone, Default)]
pub struct OidcSettings {
    pub provider_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Accepted token audiences, comma-separated in the environment.
    pub audience: Vec<String>,
}

/// Inputs for the OAuth protected-resource metadata document.
#[derive(Debug, Clone, Default)]
pub struct OauthMetadataSettings {
    /// Pre-rendered metadata document; overrides all assembly.
    pub raw_json: Option<String>,
    /// Comma-separated authorization server URLs.
    pub authorization_servers: Vec<String>,
    pub resource_name: Option<String>,
    pub resource_documentation: Option<String>,
    /// Advertised in the WWW-Authenticate challenge.
    pub resource_metadata_url: String,
}

fn env_flag(env: &HashMap<String, String>, key: &str) -> bool {
    env.get(key).map(|v| v == "true").unwrap_or(false)
}

fn env_list(env: &HashMap<String, String>, key: &str) -> Vec<String> {
    env.get(key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_env_map(&std::env::vars().collect())
    }

    pub fn from_env_map(env: &HashMap<String, String>) -> Result<Self> {
        let host = env
            .get("HOST")
            .cloned()
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match env.get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("Invalid PORT value: {raw}"))?,
            None => DEFAULT_PORT,
        };

        let resource_metadata_url = env
            .get("RESOURCE_METADATA_URL")
            .cloned()
            .unwrap_or_else(|| {
                format!("http://{host}:{port}/.well-known/oauth-protected-resource/mcp")
            });

        let settings = Settings {
            http_transport: env_flag(env, "ENABLE_HTTP_TRANSPORT"),
            auth_enabled: env_flag(env, "ENABLE_AUTH"),
            allow_only_non_destructive: env_flag(env, "ALLOW_ONLY_NON_DESTRUCTIVE_TOOLS"),
            dns_rebinding_protection: env_flag(env, "DNS_REBINDING_PROTECTION"),
            dns_rebinding_allowed_host: env
                .get("DNS_REBINDING_ALLOWED_HOST")
                .cloned()
                .unwrap_or_else(|| DEFAULT_ALLOWED_HOST.to_string()),
            oidc: OidcSettings {
                provider_url: env.get("OIDC_PROVIDER_URL").cloned(),
                client_id: env.get("OIDC_CLIENT_ID").cloned(),
                client_secret: env.get("OIDC_CLIENT_SECRET").cloned(),
                audience: env_list(env, "OIDC_AUDIENCE"),
            },
            oauth_metadata: OauthMetadataSettings {
                raw_json: env.get("OAUTH_METADATA_JSON").cloned(),
                authorization_servers: env_list(env, "OAUTH_AUTHORIZATION_SERVERS"),
                resource_name: env.get("RESOURCE_NAME").cloned(),
                resource_documentation: env.get("RESOURCE_DOCUMENTATION").cloned(),
                resource_metadata_url,
            },
            kubectl_path: env
                .get("KUBECTL_PATH")
                .cloned()
                .unwrap_or_else(|| DEFAULT_KUBECTL_PATH.to_string()),
            helm_path: env
                .get("HELM_PATH")
                .cloned()
                .unwrap_or_else(|| DEFAULT_HELM_PATH.to_string()),
            host,
            port,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Fail fast on configurations that would only break at request time.
    fn validate(&self) -> Result<()> {
        if self.auth_enabled {
            if self.oidc.provider_url.is_none() {
                bail!("ENABLE_AUTH is set but OIDC_PROVIDER_URL is missing");
            }
            if self.oidc.client_id.is_none() {
                bail!("ENABLE_AUTH is set but OIDC_CLIENT_ID is missing");
            }
            if self.oidc.client_secret.is_none() {
                bail!("ENABLE_AUTH is set but OIDC_CLIENT_SECRET is missing");
            }
        }
        if let Some(raw) = &self.oauth_metadata.raw_json {
            serde_json::from_str::<serde_json::Value>(raw)
                .context("OAUTH_METADATA_JSON is not valid JSON")?;
        }
        Ok(())
    }
}
