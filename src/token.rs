//! Bearer token path.
//!
//! Signature and claim verification belong to a [`TokenVerifier`]; this module
//! only turns verified claims into a token identity.

use crate::{error::AuthError, identity::AuthenticatedIdentity};
use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Claims accepted by a verifier, with scopes already extracted.
#[derive(Clone, Debug, Default)]
pub struct VerifiedToken {
    pub claims: Map<String, Value>,
    pub scopes: BTreeSet<String>,
}

impl VerifiedToken {
    /// Read scopes from `scp` (array or space-delimited string), falling back
    /// to `scope`.
    #[must_use]
    pub fn from_claims(claims: Map<String, Value>) -> Self {
        let scopes = claims
            .get("scp")
            .or_else(|| claims.get("scope"))
            .map(scopes_of)
            .unwrap_or_default();

        Self { claims, scopes }
    }

    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claims
            .get("sub")
            .and_then(Value::as_str)
            .filter(|sub| !sub.is_empty())
    }
}

fn scopes_of(value: &Value) -> BTreeSet<String> {
    match value {
        Value::String(scopes) => scopes.split_whitespace().map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter(|scope| !scope.is_empty())
            .map(str::to_string)
            .collect(),
        _ => BTreeSet::new(),
    }
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token` for `audience`.
    ///
    /// # Errors
    /// `InvalidToken` when the token is malformed, expired or for another audience.
    async fn verify(&self, token: &SecretString, audience: &str)
        -> Result<VerifiedToken, AuthError>;
}

#[must_use]
pub fn identity_from_token(token: &VerifiedToken) -> AuthenticatedIdentity {
    AuthenticatedIdentity::token(token.subject().map(str::to_string), token.scopes.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityKind;
    use serde_json::json;

    fn claims(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn reads_scope_array() {
        let token = VerifiedToken::from_claims(claims(json!({
            "sub": "client-1",
            "scp": ["read", "write", ""]
        })));
        assert_eq!(
            token.scopes,
            BTreeSet::from(["read".to_string(), "write".to_string()])
        );

        let identity = identity_from_token(&token);
        assert_eq!(identity.kind, IdentityKind::Token);
        assert_eq!(identity.subject_id.as_deref(), Some("client-1"));
    }

    #[test]
    fn reads_space_delimited_scope() {
        let token = VerifiedToken::from_claims(claims(json!({ "scope": "read  delete" })));
        assert_eq!(
            token.scopes,
            BTreeSet::from(["delete".to_string(), "read".to_string()])
        );
        assert_eq!(token.subject(), None);
    }

    #[test]
    fn missing_scopes_grant_nothing() {
        let token = VerifiedToken::from_claims(claims(json!({ "sub": "x", "scp": 42 })));
        assert!(token.scopes.is_empty());
        assert!(identity_from_token(&token).scopes.is_empty());
    }
}
