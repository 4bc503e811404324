//! Bearer-token authentication for the HTTP transport.
//!
//! One middleware guards the protocol endpoints: health, readiness, and the
//! well-known documents stay open so unauthenticated clients can discover
//! how to authenticate.

pub mod claims;
pub mod metadata;
pub mod provider;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

pub use claims::{principal_from_claims, Claims};
pub use provider::{AuthError, OidcValidator, TokenValidator};

use crate::mcp::protocol::{McpError, McpResponse};
use crate::server::state::ServerState;

/// The authenticated caller, attached to the request extensions and handed
/// to tool handlers.
#[derive(Debug, Clone)]
pub struct Principal {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub roles: Vec<String>,
    /// End-user token (as opposed to a machine client).
    pub is_user: bool,
    /// The full decoded claim set, as received.
    pub claims: serde_json::Value,
}

/// Paths that never require a token.
pub fn skip_auth(path: &str) -> bool {
    path == "/health" || path == "/ready" || path.starts_with("/.well-known/")
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn challenge(state: &ServerState) -> String {
    format!(
        "Bearer realm=\"OAuth\", resource_metadata=\"{}\"",
        state.settings.oauth_metadata.resource_metadata_url
    )
}

fn unauthorized(state: &ServerState, detail: String) -> Response {
    let envelope = McpResponse::error(None, McpError::Unauthorized(detail));
    let body = serde_json::to_string(&envelope).unwrap_or_default();
    Response::builder()
        .status(StatusCode::UNAUTHORIZED)
        .header(header::WWW_AUTHENTICATE, challenge(state))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::UNAUTHORIZED.into_response())
}

/// Authentication gate. A no-op when auth is disabled.
pub async fn require_auth(
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Response {
    if !state.settings.auth_enabled || skip_auth(request.uri().path()) {
        return next.run(request).await;
    }

    let Some(validator) = state.validator.clone() else {
        return unauthorized(&state, "Authentication is not configured".to_string());
    };

    let Some(token) = bearer_token(&request) else {
        return unauthorized(&state, AuthError::MissingToken.to_string());
    };

    let claims = match validator.validate(token).await {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Token rejected: {}", e);
            return unauthorized(&state, e.to_string());
        }
    };

    let principal = match principal_from_claims(claims) {
        Ok(principal) => principal,
        Err(e) => return unauthorized(&state, e.to_string()),
    };

    debug!("Authenticated {}", principal.subject);
    request.extensions_mut().insert(principal);
    next.run(request).await
}
