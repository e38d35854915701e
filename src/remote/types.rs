//! Identity provider payloads.
//!
//! Responses are decoded once at the transport boundary into [`Transaction`],
//! [`PushPollResult`] and [`GroupMembership`]; nothing downstream re-reads the
//! raw JSON.

use secrecy::SecretString;
use serde::Deserialize;

pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_MFA_REQUIRED: &str = "MFA_REQUIRED";
pub const STATUS_MFA_CHALLENGE: &str = "MFA_CHALLENGE";

/// Raw transaction / poll body as sent by the provider.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionBody {
    state_token: Option<String>,
    status: Option<String>,
    factor_result: Option<String>,
    #[serde(rename = "_embedded")]
    embedded: Option<EmbeddedBody>,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddedBody {
    user: Option<UserBody>,
    #[serde(default)]
    factors: Vec<FactorBody>,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FactorBody {
    factor_type: Option<String>,
    provider: Option<String>,
    #[serde(rename = "_links")]
    links: Option<LinksBody>,
}

#[derive(Debug, Deserialize)]
struct LinksBody {
    verify: Option<LinkBody>,
}

#[derive(Debug, Deserialize)]
struct LinkBody {
    href: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroupBody {
    profile: Option<GroupProfileBody>,
}

#[derive(Debug, Deserialize)]
struct GroupProfileBody {
    name: Option<String>,
}

impl TransactionBody {
    fn subject_id(&self) -> Option<String> {
        self.embedded
            .as_ref()
            .and_then(|embedded| embedded.user.as_ref())
            .and_then(|user| user.id.clone())
            .filter(|id| !id.is_empty())
    }
}

/// What the provider wants next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransactionState {
    /// Primary credentials accepted, no step-up needed.
    Success,
    /// `MFA_REQUIRED` or `MFA_CHALLENGE` with the enrolled factors.
    ChallengeRequired(Vec<Factor>),
    /// Any other status, kept verbatim for diagnostics.
    Other(String),
}

/// Decoded authentication transaction.
#[derive(Debug)]
pub struct Transaction {
    pub state: TransactionState,
    pub state_token: Option<SecretString>,
    pub subject_id: Option<String>,
}

impl From<TransactionBody> for Transaction {
    fn from(body: TransactionBody) -> Self {
        let subject_id = body.subject_id();
        let state = match body.status.as_deref() {
            Some(STATUS_SUCCESS) => TransactionState::Success,
            Some(STATUS_MFA_REQUIRED | STATUS_MFA_CHALLENGE) => TransactionState::ChallengeRequired(
                body.embedded
                    .map(|embedded| embedded.factors.into_iter().map(Factor::from).collect())
                    .unwrap_or_default(),
            ),
            Some(other) if !other.is_empty() => TransactionState::Other(other.to_string()),
            _ => TransactionState::Other("UNKNOWN".to_string()),
        };

        Self {
            state,
            state_token: body
                .state_token
                .filter(|token| !token.is_empty())
                .map(SecretString::from),
            subject_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FactorType {
    Push,
    Other(String),
}

/// Enrolled step-up factor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Factor {
    pub factor_type: FactorType,
    pub provider: String,
    pub challenge_ref: Option<String>,
}

impl From<FactorBody> for Factor {
    fn from(body: FactorBody) -> Self {
        let factor_type = match body.factor_type.as_deref() {
            Some("push") => FactorType::Push,
            other => FactorType::Other(other.unwrap_or_default().to_string()),
        };

        Self {
            factor_type,
            provider: body.provider.unwrap_or_default(),
            challenge_ref: body
                .links
                .and_then(|links| links.verify)
                .and_then(|verify| verify.href)
                .filter(|href| !href.is_empty()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FactorResult {
    Pending,
    Success,
    Rejected,
    Timeout,
}

/// One poll of a push challenge.
#[derive(Clone, Debug)]
pub struct PushPollResult {
    pub status: Option<String>,
    pub factor_result: FactorResult,
    /// Provider value before normalization, e.g. `WAITING`.
    pub raw_factor_result: Option<String>,
    pub subject_id: Option<String>,
}

impl PushPollResult {
    /// Terminal success: the transaction or the factor reports success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS) || self.factor_result == FactorResult::Success
    }

    /// Best available description of where the challenge stopped.
    #[must_use]
    pub fn describe(&self) -> &str {
        self.raw_factor_result
            .as_deref()
            .or(self.status.as_deref())
            .unwrap_or("MFA push timeout")
    }
}

impl From<TransactionBody> for PushPollResult {
    fn from(body: TransactionBody) -> Self {
        let subject_id = body.subject_id();
        let factor_result = match body.factor_result.as_deref() {
            Some("SUCCESS") => FactorResult::Success,
            Some("REJECTED") => FactorResult::Rejected,
            Some("TIMEOUT") => FactorResult::Timeout,
            _ => FactorResult::Pending,
        };

        Self {
            status: body.status.filter(|status| !status.is_empty()),
            factor_result,
            raw_factor_result: body.factor_result.filter(|result| !result.is_empty()),
            subject_id,
        }
    }
}

/// Group membership returned by the management API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupMembership {
    pub name: Option<String>,
}

impl From<GroupBody> for GroupMembership {
    fn from(body: GroupBody) -> Self {
        Self {
            name: body
                .profile
                .and_then(|profile| profile.name)
                .filter(|name| !name.is_empty()),
        }
    }
}
