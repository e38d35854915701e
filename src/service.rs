//! `Authorization` header entry point.
//!
//! Basic credentials go through the [`Authenticator`]; Bearer tokens go to the
//! configured [`TokenVerifier`] and never touch the authenticator.

use crate::{
    authenticator::Authenticator,
    credentials::{parse_authorization, Credentials},
    error::AuthError,
    identity::AuthenticatedIdentity,
    token::{identity_from_token, TokenVerifier},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

pub struct AuthenticationService {
    authenticator: Arc<Authenticator>,
    verifier: Option<Arc<dyn TokenVerifier>>,
}

impl AuthenticationService {
    #[must_use]
    pub fn new(authenticator: Arc<Authenticator>) -> Self {
        Self {
            authenticator,
            verifier: None,
        }
    }

    #[must_use]
    pub fn with_token_verifier(mut self, verifier: Arc<dyn TokenVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    #[must_use]
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    /// Authenticate the raw `Authorization` header value.
    ///
    /// # Errors
    /// Header parsing errors, any [`Authenticator`] error, `InvalidToken` from
    /// the verifier, or `Configuration` when Bearer is used without a verifier.
    #[instrument(skip_all)]
    pub async fn authenticate_header(
        &self,
        header: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        match parse_authorization(header)? {
            Credentials::Basic { username, password } => {
                self.authenticator
                    .authenticate_with_cancel(&username, &password, cancel)
                    .await
            }
            Credentials::Bearer(token) => {
                let verifier = self.verifier.as_ref().ok_or_else(|| {
                    AuthError::Configuration("bearer authentication not configured".to_string())
                })?;

                let audience = self.authenticator.config().audience().ok_or_else(|| {
                    AuthError::Configuration("AUTHGATE_AUDIENCE not set".to_string())
                })?;

                let verified = verifier.verify(&token, audience).await?;
                debug!("bearer token accepted with {} scopes", verified.scopes.len());

                Ok(identity_from_token(&verified))
            }
        }
    }
}
