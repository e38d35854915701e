//! Request-time permission checks.

use crate::{identity::AuthenticatedIdentity, permissions::PermissionResolver};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Why a request was refused. Never carries the caller's own permissions.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Deny {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Insufficient permissions, required permission: {permission}")]
    InsufficientScope { permission: String },
}

impl Deny {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InsufficientScope { .. } => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for Deny {
    fn into_response(self) -> Response {
        let body = match &self {
            Self::Unauthenticated => json!({
                "error": "Authentication required",
                "details": "Missing or invalid credentials",
            }),
            Self::InsufficientScope { permission } => json!({
                "error": "Insufficient permissions",
                "details": format!("Required permission: {permission}"),
            }),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Deny),
}

impl Decision {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// # Errors
    /// Returns the [`Deny`] reason when the request was refused.
    pub fn into_result(self) -> Result<(), Deny> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AuthorizationGate {
    resolver: PermissionResolver,
}

impl AuthorizationGate {
    #[must_use]
    pub fn new(resolver: PermissionResolver) -> Self {
        Self { resolver }
    }

    #[must_use]
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    #[must_use]
    pub fn require_permission(
        &self,
        identity: Option<&AuthenticatedIdentity>,
        permission: &str,
    ) -> Decision {
        let Some(identity) = identity else {
            return Decision::Deny(Deny::Unauthenticated);
        };

        if self.resolver.has_permission(identity, permission) {
            Decision::Allow
        } else {
            debug!(
                "{} identity lacks permission {}",
                identity.kind.as_str(),
                permission
            );
            Decision::Deny(Deny::InsufficientScope {
                permission: permission.to_string(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        authenticator::Authenticator,
        config::IdentityConfig,
        credentials::CredentialStore,
        identity::IdentityKind,
        mfa::PushSettings,
        permissions::{PERMISSION_DELETE, PERMISSION_READ},
        remote::test_support::ScriptedProvider,
    };
    use secrecy::SecretString;
    use std::{collections::BTreeSet, sync::Arc};

    #[test]
    fn missing_identity_is_unauthenticated() {
        let decision = AuthorizationGate::default().require_permission(None, PERMISSION_READ);
        assert_eq!(decision, Decision::Deny(Deny::Unauthenticated));
        assert_eq!(
            decision.into_result().unwrap_err().status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn insufficient_scope_names_only_the_required_permission() {
        let identity = AuthenticatedIdentity::token(None, BTreeSet::from(["read".to_string()]));
        let decision = AuthorizationGate::default().require_permission(Some(&identity), "write");

        let Decision::Deny(reason) = decision else {
            panic!("expected deny");
        };
        assert_eq!(
            reason,
            Deny::InsufficientScope {
                permission: "write".to_string()
            }
        );
        assert_eq!(reason.status_code(), StatusCode::FORBIDDEN);
        assert!(!reason.to_string().contains("read"));
    }

    #[test]
    fn deny_response_status() {
        let response = Deny::InsufficientScope {
            permission: "delete".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            Deny::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn readuser_can_read_but_not_delete() {
        let config = IdentityConfig::new()
            .with_issuer("https://idp.test/oauth2/default")
            .with_client_id("client")
            .with_audience("api://default");
        let provider = Arc::new(ScriptedProvider::new());
        let authenticator = Authenticator::new(
            Arc::new(config),
            Arc::new(CredentialStore::with_defaults()),
            provider.clone(),
            PushSettings::new(),
        )
        .unwrap();

        let identity = authenticator
            .authenticate("readuser", &SecretString::from("readpass".to_string()))
            .await
            .unwrap();
        assert_eq!(identity.kind, IdentityKind::Local);
        assert_eq!(identity.groups, BTreeSet::from(["ReadUsers".to_string()]));

        let gate = AuthorizationGate::default();
        assert!(gate
            .require_permission(Some(&identity), PERMISSION_READ)
            .is_allowed());
        assert_eq!(
            gate.require_permission(Some(&identity), PERMISSION_DELETE),
            Decision::Deny(Deny::InsufficientScope {
                permission: PERMISSION_DELETE.to_string()
            })
        );
        assert_eq!(provider.starts(), 0);
    }
}
