//! Username/password authentication.
//!
//! Flow Overview:
//! 1) `LocalLookup`: a matching local entry ends the flow with a local identity.
//! 2) `RemoteStart`: anything else starts one transaction at the identity provider.
//! 3) `Inspect`: `SUCCESS` goes straight to groups, step-up goes to challenge
//!    selection, any other status is a credential failure.
//! 4) `ChallengeSelect`: pick an accepted push factor and poll it to completion.
//! 5) `ResolveGroups`: fetch the subject's groups and build the remote identity.
//!
//! Each call owns its transaction; nothing is shared between concurrent calls.

use crate::{
    config::IdentityConfig,
    credentials::CredentialStore,
    error::AuthError,
    identity::AuthenticatedIdentity,
    mfa::{select_push_factor, PushPoller, PushSettings},
    remote::{Factor, IdentityProvider, Transaction, TransactionState},
};
use secrecy::{ExposeSecret, SecretString};
use std::{collections::BTreeSet, future::Future, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

enum Step {
    LocalLookup,
    RemoteStart,
    Inspect(Transaction),
    ChallengeSelect {
        factors: Vec<Factor>,
        state_token: Option<SecretString>,
        subject_id: Option<String>,
    },
    ResolveGroups {
        subject_id: String,
    },
}

pub struct Authenticator {
    store: Arc<CredentialStore>,
    provider: Arc<dyn IdentityProvider>,
    poller: PushPoller,
    config: Arc<IdentityConfig>,
}

impl Authenticator {
    /// Validate `config` and wire the collaborators together.
    ///
    /// # Errors
    /// `Configuration` when a required setting is missing. A missing management
    /// token is only logged; remote logins then fail with `Configuration`
    /// before contacting the provider.
    pub fn new(
        config: Arc<IdentityConfig>,
        store: Arc<CredentialStore>,
        provider: Arc<dyn IdentityProvider>,
        settings: PushSettings,
    ) -> Result<Self, AuthError> {
        let report = config.validate();

        if !report.is_valid() {
            return Err(AuthError::Configuration(format!(
                "missing required settings: {}",
                report.missing.join(", ")
            )));
        }

        for warning in &report.warnings {
            warn!("{} not set, remote logins cannot resolve groups", warning);
        }

        let poller = PushPoller::new(provider.clone(), config.clone(), settings);

        Ok(Self {
            store,
            provider,
            poller,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// Authenticate without an external cancellation signal.
    ///
    /// # Errors
    /// See [`Authenticator::authenticate_with_cancel`].
    pub async fn authenticate(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        self.authenticate_with_cancel(username, password, &CancellationToken::new())
            .await
    }

    /// Authenticate `username`/`password`, aborting promptly when `cancel` fires.
    ///
    /// # Errors
    /// `InvalidCredentials`, `MfaDenied`, `MfaTimeout`, `RemoteUnavailable`,
    /// `Configuration` or `Cancelled`.
    #[instrument(skip(self, password, cancel))]
    pub async fn authenticate_with_cancel(
        &self,
        username: &str,
        password: &SecretString,
        cancel: &CancellationToken,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let result = self.run(username, password, cancel).await;

        match &result {
            Ok(identity) => info!(
                "authenticated {} via {}",
                username,
                identity.kind.as_str()
            ),
            Err(err) if err.is_operational() => error!("authentication failed: {}", err),
            Err(err) => debug!("authentication denied: {}", err),
        }

        result
    }

    // Checked before the transaction starts so no push is sent for a login
    // that cannot resolve groups.
    fn require_api_token(&self) -> Result<(), AuthError> {
        if self.config.api_token().is_none() {
            return Err(AuthError::Configuration(
                "AUTHGATE_API_TOKEN required for group lookup".to_string(),
            ));
        }
        Ok(())
    }

    async fn run(
        &self,
        username: &str,
        password: &SecretString,
        cancel: &CancellationToken,
    ) -> Result<AuthenticatedIdentity, AuthError> {
        let mut step = Step::LocalLookup;

        loop {
            step = match step {
                Step::LocalLookup => {
                    if let Some(entry) = self.store.verify(username, password.expose_secret()) {
                        return Ok(AuthenticatedIdentity::local(username, entry.groups.clone()));
                    }
                    Step::RemoteStart
                }

                Step::RemoteStart => {
                    self.require_api_token()?;

                    let transaction =
                        cancellable(cancel, self.provider.start_transaction(username, password))
                            .await?
                            .ok_or_else(|| {
                                AuthError::InvalidCredentials(
                                    "empty transaction response".to_string(),
                                )
                            })?;
                    Step::Inspect(transaction)
                }

                Step::Inspect(transaction) => match transaction.state {
                    TransactionState::Success => Step::ResolveGroups {
                        subject_id: transaction.subject_id.ok_or_else(unresolved_subject)?,
                    },
                    TransactionState::ChallengeRequired(factors) => Step::ChallengeSelect {
                        factors,
                        state_token: transaction.state_token,
                        subject_id: transaction.subject_id,
                    },
                    TransactionState::Other(status) => {
                        return Err(AuthError::InvalidCredentials(format!(
                            "unexpected transaction status: {status}"
                        )));
                    }
                },

                Step::ChallengeSelect {
                    factors,
                    state_token,
                    subject_id,
                } => {
                    let challenge_ref = select_push_factor(&factors).ok_or_else(|| {
                        AuthError::MfaDenied("no supported step-up factor enrolled".to_string())
                    })?;

                    let state_token = state_token.ok_or_else(|| AuthError::RemoteUnavailable {
                        status: None,
                        detail: "challenge issued without a state token".to_string(),
                    })?;

                    let resolution = self.poller.poll(challenge_ref, &state_token, cancel).await?;

                    Step::ResolveGroups {
                        subject_id: resolution
                            .subject_id
                            .or(subject_id)
                            .ok_or_else(unresolved_subject)?,
                    }
                }

                Step::ResolveGroups { subject_id } => {
                    self.require_api_token()?;

                    let groups: BTreeSet<String> =
                        cancellable(cancel, self.provider.list_groups(&subject_id))
                            .await?
                            .into_iter()
                            .filter_map(|membership| membership.name)
                            .collect();

                    return Ok(AuthenticatedIdentity::remote(username, subject_id, groups));
                }
            };
        }
    }
}

fn unresolved_subject() -> AuthError {
    AuthError::InvalidCredentials("authenticated but subject unresolved".to_string())
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, AuthError>>,
) -> Result<T, AuthError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(AuthError::Cancelled),
        result = call => result,
    }
}
