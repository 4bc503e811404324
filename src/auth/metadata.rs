//! OAuth protected-resource metadata (RFC 9728).

use serde_json::{json, Value};

use crate::config::Settings;

/// Build the document served at `/.well-known/oauth-protected-resource/mcp`.
///
/// A pre-rendered `OAUTH_METADATA_JSON` wins outright; otherwise the
/// document is assembled from the individual settings.
pub fn protected_resource_metadata(settings: &Settings) -> Value {
    if let Some(raw) = &settings.oauth_metadata.raw_json {
        if let Ok(value) = serde_json::from_str(raw) {
            return value;
        }
    }

    let resource = format!("http://{}:{}/mcp", settings.host, settings.port);
    let mut authorization_servers = settings.oauth_metadata.authorization_servers.clone();
    if authorization_servers.is_empty() {
        if let Some(provider) = &settings.oidc.provider_url {
            authorization_servers.push(provider.clone());
        }
    }

    let mut doc = json!({
        "resource": resource,
        "authorization_servers": authorization_servers,
        "bearer_methods_supported": ["header"],
        "scopes_supported": settings.oidc.audience,
    });

    if let Some(name) = &settings.oauth_metadata.resource_name {
        doc["resource_name"] = json!(name);
    }
    if let Some(docs) = &settings.oauth_metadata.resource_documentation {
        doc["resource_documentation"] = json!(docs);
    }
    doc
}
