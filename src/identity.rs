//! Normalized identity produced by every authentication path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which backend produced an identity, and therefore which of `groups` or
/// `scopes` is authoritative.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Local,
    Remote,
    Token,
}

impl IdentityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
            Self::Token => "token",
        }
    }

    /// Local and remote identities resolve permissions through group membership.
    #[must_use]
    pub const fn is_group_based(self) -> bool {
        matches!(self, Self::Local | Self::Remote)
    }
}

/// Authenticated caller, created once per successful authentication.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AuthenticatedIdentity {
    pub kind: IdentityKind,
    pub subject_id: Option<String>,
    pub username: Option<String>,
    pub groups: BTreeSet<String>,
    pub scopes: BTreeSet<String>,
}

impl AuthenticatedIdentity {
    #[must_use]
    pub fn local(username: &str, groups: BTreeSet<String>) -> Self {
        Self {
            kind: IdentityKind::Local,
            subject_id: None,
            username: Some(username.to_string()),
            groups,
            scopes: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn remote(username: &str, subject_id: String, groups: BTreeSet<String>) -> Self {
        Self {
            kind: IdentityKind::Remote,
            subject_id: Some(subject_id),
            username: Some(username.to_string()),
            groups,
            scopes: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn token(subject_id: Option<String>, scopes: BTreeSet<String>) -> Self {
        Self {
            kind: IdentityKind::Token,
            subject_id,
            username: None,
            groups: BTreeSet::new(),
            scopes,
        }
    }
}
