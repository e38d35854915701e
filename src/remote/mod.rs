//! Remote identity provider contract.
//!
//! Flow Overview:
//! 1) Start a transaction with the caller's username/password.
//! 2) If the provider asks for step-up, advance the push challenge until it resolves.
//! 3) Fetch the subject's group memberships through the management API.

pub mod client;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;

use crate::error::AuthError;
use async_trait::async_trait;
use secrecy::SecretString;

pub use client::HttpIdentityClient;
pub use types::{
    Factor, FactorResult, FactorType, GroupMembership, PushPollResult, Transaction,
    TransactionState,
};

/// Transport operations the authenticator depends on.
///
/// Each call is a single attempt; implementations must not retry.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Start a transaction. `Ok(None)` means the provider returned no body.
    ///
    /// # Errors
    /// `RemoteUnavailable` on network failure or a non-success status.
    async fn start_transaction(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Option<Transaction>, AuthError>;

    /// Poll/advance a push challenge at an absolute `url`.
    ///
    /// # Errors
    /// `RemoteUnavailable` on network failure or a non-success status.
    async fn advance_challenge(
        &self,
        url: &str,
        state_token: &SecretString,
    ) -> Result<PushPollResult, AuthError>;

    /// List the groups `subject_id` belongs to.
    ///
    /// # Errors
    /// `Configuration` without a management token, `RemoteUnavailable` otherwise.
    async fn list_groups(&self, subject_id: &str) -> Result<Vec<GroupMembership>, AuthError>;
}
