//! Streamable HTTP transport.
//!
//! One POST endpoint carries the whole protocol; the channel is stateless,
//! so every request is self-contained and no `initialize` handshake is
//! required. Wrong verbs on the endpoint get a proper JSON-RPC envelope
//! rather than a bare status code.

use anyhow::{Context, Result};
use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use super::logging::log_requests;
use super::state::ServerState;
use crate::auth::{metadata::protected_resource_metadata, require_auth, Principal};
use crate::mcp::handler::{handle_message, ChannelMode};
use crate::mcp::protocol::{McpError, McpResponse};

/// Protocol bodies are small; anything beyond this is hostile.
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn make_app(state: ServerState) -> Router {
    let mcp_routes = Router::new()
        .route(
            "/mcp",
            post(mcp_post)
                .get(method_not_allowed)
                .delete(method_not_allowed),
        )
        .route(
            "/mcp/",
            post(mcp_post)
                .get(method_not_allowed)
                .delete(method_not_allowed),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(middleware::from_fn_with_state(state.clone(), check_host));

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route(
            "/.well-known/oauth-protected-resource/mcp",
            get(oauth_metadata),
        )
        .merge(mcp_routes)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

pub async fn run_http_server(state: ServerState) -> Result<()> {
    let addr = format!("{}:{}", state.settings.host, state.settings.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HTTP transport listening on {}", addr);

    let app = make_app(state);
    axum::serve(listener, app)
        .await
        .context("HTTP server terminated")?;
    Ok(())
}

/// Guard against DNS rebinding: when enabled, the Host header must match
/// the configured allowed host (port is ignored).
async fn check_host(State(state): State<ServerState>, request: Request, next: Next) -> Response {
    if state.settings.dns_rebinding_protection {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(':').next().unwrap_or(v))
            .unwrap_or("");
        if host != state.settings.dns_rebinding_allowed_host {
            let envelope = McpResponse::error(
                None,
                McpError::InvalidRequest(format!("Host not allowed: {host}")),
            );
            return (StatusCode::FORBIDDEN, Json(envelope)).into_response();
        }
    }
    next.run(request).await
}

async fn mcp_post(State(state): State<ServerState>, request: Request) -> Response {
    let principal = request.extensions().get::<Principal>().cloned();

    let bytes = match to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let envelope = McpResponse::error(None, McpError::ParseError(e.to_string()));
            return (StatusCode::BAD_REQUEST, Json(envelope)).into_response();
        }
    };
    let text = String::from_utf8_lossy(&bytes);

    match handle_message(&text, &state, principal, ChannelMode::Stateless).await {
        Some(response) => {
            let status = error_status(&response);
            (status, Json(response)).into_response()
        }
        // Notifications are accepted without a body
        None => (StatusCode::ACCEPTED, Body::empty()).into_response(),
    }
}

fn error_status(response: &McpResponse) -> StatusCode {
    match &response.error {
        // The envelope carries the status decided by McpError::http_status
        Some(error) => {
            StatusCode::from_u16(error.http_status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
        None => StatusCode::OK,
    }
}

async fn method_not_allowed() -> Response {
    let envelope = McpResponse::error(None, McpError::MethodNotAllowed);
    (StatusCode::METHOD_NOT_ALLOWED, Json(envelope)).into_response()
}

async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

async fn ready(State(state): State<ServerState>) -> Response {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "auth": {
            "enabled": state.settings.auth_enabled,
            "audience": state.settings.oidc.audience,
        },
        "tools": state.registry.tool_count(),
    }))
    .into_response()
}

async fn oauth_metadata(State(state): State<ServerState>) -> Response {
    Json(protected_resource_metadata(&state.settings)).into_response()
}
