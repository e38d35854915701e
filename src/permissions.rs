//! Permission resolution.
//!
//! Group identities hold a permission through membership in the group mapped
//! to it. Token identities carry permissions directly as scopes. Resolution is
//! pure: no I/O and no failure, missing data simply grants nothing.

use crate::{
    credentials::store::{GROUP_DELETE_USERS, GROUP_READ_USERS, GROUP_WRITE_USERS},
    identity::{AuthenticatedIdentity, IdentityKind},
};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::warn;

pub const PERMISSION_READ: &str = "read";
pub const PERMISSION_WRITE: &str = "write";
pub const PERMISSION_DELETE: &str = "delete";

/// Default `permission -> group` table.
pub const PERMISSION_GROUPS: &[(&str, &str)] = &[
    (PERMISSION_READ, GROUP_READ_USERS),
    (PERMISSION_WRITE, GROUP_WRITE_USERS),
    (PERMISSION_DELETE, GROUP_DELETE_USERS),
];

#[derive(Clone, Debug)]
pub struct PermissionResolver {
    // table order is kept for summaries
    mapping: Vec<(String, String)>,
}

impl Default for PermissionResolver {
    fn default() -> Self {
        Self::new(PERMISSION_GROUPS.iter().copied())
    }
}

impl PermissionResolver {
    /// Build a resolver from `(permission, group)` pairs. A later pair for the
    /// same permission replaces the earlier one.
    #[must_use]
    pub fn new<P, G>(mapping: impl IntoIterator<Item = (P, G)>) -> Self
    where
        P: Into<String>,
        G: Into<String>,
    {
        let mut table: Vec<(String, String)> = Vec::new();

        for (permission, group) in mapping {
            let permission = permission.into();
            let group = group.into();
            match table.iter_mut().find(|(existing, _)| *existing == permission) {
                Some(entry) => entry.1 = group,
                None => table.push((permission, group)),
            }
        }

        Self { mapping: table }
    }

    #[must_use]
    pub fn group_for(&self, permission: &str) -> Option<&str> {
        self.mapping
            .iter()
            .find(|(name, _)| name == permission)
            .map(|(_, group)| group.as_str())
    }

    #[must_use]
    pub fn has_permission(&self, identity: &AuthenticatedIdentity, permission: &str) -> bool {
        if permission.is_empty() {
            return false;
        }

        match identity.kind {
            IdentityKind::Local | IdentityKind::Remote => match self.group_for(permission) {
                Some(group) => identity.groups.contains(group),
                None => {
                    warn!("permission {} has no group mapping", permission);
                    false
                }
            },
            IdentityKind::Token => identity.scopes.contains(permission),
        }
    }

    #[must_use]
    pub fn permissions_of(&self, identity: &AuthenticatedIdentity) -> BTreeSet<String> {
        self.ordered_permissions(identity).into_iter().collect()
    }

    /// Printable view of what `identity` may do. `None` yields an empty summary.
    #[must_use]
    pub fn summarize(&self, identity: Option<&AuthenticatedIdentity>) -> PermissionSummary {
        let Some(identity) = identity else {
            return PermissionSummary {
                kind: "none",
                source: None,
                username: None,
                subject_id: None,
                groups: None,
                scopes: None,
                permissions: Vec::new(),
            };
        };

        let (groups, scopes) = if identity.kind.is_group_based() {
            (Some(identity.groups.iter().cloned().collect()), None)
        } else {
            (None, Some(identity.scopes.iter().cloned().collect()))
        };

        PermissionSummary {
            kind: identity.kind.as_str(),
            source: Some(source_of(identity.kind)),
            username: identity.username.clone(),
            subject_id: identity.subject_id.clone(),
            groups,
            scopes,
            permissions: self.ordered_permissions(identity),
        }
    }

    fn ordered_permissions(&self, identity: &AuthenticatedIdentity) -> Vec<String> {
        if identity.kind.is_group_based() {
            self.mapping
                .iter()
                .filter(|(_, group)| identity.groups.contains(group))
                .map(|(permission, _)| permission.clone())
                .collect()
        } else {
            identity.scopes.iter().cloned().collect()
        }
    }
}

const fn source_of(kind: IdentityKind) -> &'static str {
    match kind {
        IdentityKind::Local => "credential_store",
        IdentityKind::Remote => "identity_provider",
        IdentityKind::Token => "bearer_token",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PermissionSummary {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    pub permissions: Vec<String>,
}
