//! Token validation against an OIDC provider.
//!
//! The production validator discovers the provider's JWKS endpoint and
//! verifies token signatures locally; keys are cached and refreshed when an
//! unknown `kid` shows up.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::claims::Claims;
use crate::config::OidcSettings;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Token has no subject")]
    MissingSubject,
    #[error("No key found for kid {0}")]
    UnknownKey(String),
}

/// Validates a bearer token and returns its claims.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<Claims, AuthError>;
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    jwks_uri: String,
}

/// JWKS-backed validator.
pub struct OidcValidator {
    http: reqwest::Client,
    provider_url: String,
    audience: Vec<String>,
    keys: RwLock<HashMap<String, Jwk>>,
}

impl OidcValidator {
    pub async fn new(oidc: &OidcSettings) -> Result<Self> {
        let provider_url = oidc
            .provider_url
            .clone()
            .ok_or_else(|| anyhow!("OIDC provider URL is not configured"))?;

        let validator = Self {
            http: reqwest::Client::new(),
            provider_url,
            audience: oidc.audience.clone(),
            keys: RwLock::new(HashMap::new()),
        };
        validator.refresh_keys().await?;
        info!("OIDC validator ready for {}", validator.provider_url);
        Ok(validator)
    }

    async fn refresh_keys(&self) -> Result<()> {
        let discovery_url = format!(
            "{}/.well-known/openid-configuration",
            self.provider_url.trim_end_matches('/')
        );
        let discovery: DiscoveryDocument = self
            .http
            .get(&discovery_url)
            .send()
            .await
            .context("Failed to fetch OIDC discovery document")?
            .error_for_status()
            .context("OIDC discovery request rejected")?
            .json()
            .await
            .context("Invalid OIDC discovery document")?;

        let jwks: JwkSet = self
            .http
            .get(&discovery.jwks_uri)
            .send()
            .await
            .context("Failed to fetch JWKS")?
            .error_for_status()
            .context("JWKS request rejected")?
            .json()
            .await
            .context("Invalid JWKS document")?;

        let mut keys = self.keys.write().await;
        keys.clear();
        for jwk in jwks.keys {
            if let Some(kid) = jwk.common.key_id.clone() {
                keys.insert(kid, jwk);
            }
        }
        debug!("Loaded {} signing keys", keys.len());
        Ok(())
    }

    async fn key_for(&self, kid: &str) -> Result<Jwk, AuthError> {
        if let Some(jwk) = self.keys.read().await.get(kid) {
            return Ok(jwk.clone());
        }
        // Key rotation: refetch once before giving up
        self.refresh_keys()
            .await
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        self.keys
            .read()
            .await
            .get(kid)
            .cloned()
            .ok_or_else(|| AuthError::UnknownKey(kid.to_string()))
    }
}

#[async_trait]
impl TokenValidator for OidcValidator {
    async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let header =
            decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("Token has no kid".to_string()))?;

        let jwk = self.key_for(&kid).await?;
        let decoding_key =
            DecodingKey::from_jwk(&jwk).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let mut validation = Validation::new(header.alg);
        if header.alg == Algorithm::HS256 {
            // Symmetric algorithms never come from a public JWKS
            return Err(AuthError::InvalidToken(
                "Unsupported token algorithm".to_string(),
            ));
        }
        if self.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&self.audience);
        }

        let data = decode::<serde_json::Value>(token, &decoding_key, &validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Claims::from_raw(data.claims)
    }
}
