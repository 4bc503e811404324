//! Token claims and their mapping onto a request principal.

use serde::Deserialize;
use serde_json::Value;

use super::provider::AuthError;
use super::Principal;

/// Subjects carrying this prefix are end-user tokens; everything else is
/// treated as a machine client.
const USER_SUBJECT_PREFIX: &str = "usr_";

/// Claims from a validated access token. The mapped fields cover what the
/// gateway itself needs; `raw` keeps the full decoded claim set verbatim.
/// Audience validation happens during signature verification, so `aud` is
/// not re-checked here.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Option<Vec<String>>,
    #[serde(default)]
    pub exp: Option<u64>,
    #[serde(skip)]
    pub raw: Value,
}

impl Claims {
    /// Build claims from a decoded token payload, keeping the payload
    /// itself alongside the mapped fields.
    pub fn from_raw(raw: Value) -> Result<Self, AuthError> {
        let mut claims: Claims = serde_json::from_value(raw.clone())
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        claims.raw = raw;
        Ok(claims)
    }
}

/// Map validated claims onto a [`Principal`].
///
/// A token without a subject is rejected outright. When the token carries
/// no explicit roles, machine clients get the implicit `mcp` role while
/// user tokens get none.
pub fn principal_from_claims(claims: Claims) -> Result<Principal, AuthError> {
    let subject = claims
        .sub
        .filter(|s| !s.is_empty())
        .ok_or(AuthError::MissingSubject)?;

    let is_user = subject.starts_with(USER_SUBJECT_PREFIX);
    let roles = match claims.roles {
        Some(roles) => roles,
        None if is_user => Vec::new(),
        None => vec!["mcp".to_string()],
    };

    Ok(Principal {
        subject,
        email: claims.email,
        name: claims.name,
        roles,
        is_user,
        claims: claims.raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(sub: Option<&str>, roles: Option<Vec<&str>>) -> Claims {
        let mut payload = json!({});
        if let Some(sub) = sub {
            payload["sub"] = json!(sub);
        }
        if let Some(roles) = roles {
            payload["roles"] = json!(roles);
        }
        Claims::from_raw(payload).unwrap()
    }

    #[test]
    fn test_missing_subject_is_rejected() {
        assert!(matches!(
            principal_from_claims(claims(None, None)),
            Err(AuthError::MissingSubject)
        ));
        assert!(matches!(
            principal_from_claims(claims(Some(""), None)),
            Err(AuthError::MissingSubject)
        ));
    }

    #[test]
    fn test_user_token_defaults_to_no_roles() {
        let principal = principal_from_claims(claims(Some("usr_42"), None)).unwrap();
        assert!(principal.is_user);
        assert!(principal.roles.is_empty());
    }

    #[test]
    fn test_machine_token_defaults_to_mcp_role() {
        let principal = principal_from_claims(claims(Some("svc-deployer"), None)).unwrap();
        assert!(!principal.is_user);
        assert_eq!(principal.roles, vec!["mcp"]);
    }

    #[test]
    fn test_explicit_roles_are_kept() {
        let principal =
            principal_from_claims(claims(Some("usr_42"), Some(vec!["admin", "ops"]))).unwrap();
        assert_eq!(principal.roles, vec!["admin", "ops"]);
    }

    #[test]
    fn test_full_claim_set_is_carried_onto_principal() {
        let payload = json!({
            "sub": "usr_42",
            "groups": ["platform", "oncall"],
            "iss": "https://id.example.com"
        });
        let principal = principal_from_claims(Claims::from_raw(payload.clone()).unwrap()).unwrap();
        assert_eq!(principal.claims, payload);
        assert_eq!(principal.claims["groups"][1], "oncall");
    }

    #[test]
    fn test_from_raw_rejects_malformed_fields() {
        // roles must be an array of strings when present
        assert!(Claims::from_raw(json!({"sub": "usr_42", "roles": "admin"})).is_err());
    }
}
