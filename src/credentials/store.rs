//! Static local credential table.
//!
//! Loaded once at startup and never mutated. Entries shadow identity provider
//! accounts with the same username.

use crate::error::AuthError;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::{
    collections::{BTreeSet, HashMap},
    fs,
    path::Path,
};

pub const GROUP_READ_USERS: &str = "ReadUsers";
pub const GROUP_WRITE_USERS: &str = "WriteUsers";
pub const GROUP_DELETE_USERS: &str = "DeleteUsers";

#[derive(Clone, Debug)]
pub struct CredentialEntry {
    pub username: String,
    password: SecretString,
    pub groups: BTreeSet<String>,
}

#[derive(Deserialize)]
struct RawEntry {
    username: String,
    password: String,
    #[serde(default)]
    groups: BTreeSet<String>,
}

impl From<RawEntry> for CredentialEntry {
    fn from(raw: RawEntry) -> Self {
        Self {
            username: raw.username,
            password: SecretString::from(raw.password),
            groups: raw.groups,
        }
    }
}

impl CredentialEntry {
    #[must_use]
    pub fn new<I, S>(username: &str, password: &str, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            username: username.to_string(),
            password: SecretString::from(password.to_string()),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    fn password_matches(&self, candidate: &str) -> bool {
        constant_time_eq(
            self.password.expose_secret().as_bytes(),
            candidate.as_bytes(),
        )
    }
}

#[derive(Clone, Debug, Default)]
pub struct CredentialStore {
    entries: HashMap<String, CredentialEntry>,
}

impl CredentialStore {
    /// Build a store, rejecting duplicate usernames.
    ///
    /// # Errors
    /// Returns `AuthError::Configuration` when two entries share a username.
    pub fn new(entries: impl IntoIterator<Item = CredentialEntry>) -> Result<Self, AuthError> {
        let mut map = HashMap::new();
        for entry in entries {
            if map.contains_key(&entry.username) {
                return Err(AuthError::Configuration(format!(
                    "duplicate credential entry for {}",
                    entry.username
                )));
            }
            map.insert(entry.username.clone(), entry);
        }

        Ok(Self { entries: map })
    }

    /// The three canonical accounts, one per permission group.
    #[must_use]
    pub fn with_defaults() -> Self {
        let entries = [
            CredentialEntry::new("readuser", "readpass", [GROUP_READ_USERS]),
            CredentialEntry::new("writeuser", "writepass", [GROUP_WRITE_USERS]),
            CredentialEntry::new("deleteuser", "deletepass", [GROUP_DELETE_USERS]),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.username.clone(), entry))
                .collect(),
        }
    }

    /// Parse a JSON array of `{username, password, groups}` entries.
    ///
    /// # Errors
    /// Returns an error on malformed JSON or duplicate usernames.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<RawEntry> =
            serde_json::from_str(json).context("Invalid credentials JSON")?;
        Ok(Self::new(entries.into_iter().map(CredentialEntry::from))?)
    }

    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file: {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Entry for `username` when `password` matches exactly.
    #[must_use]
    pub fn verify(&self, username: &str, password: &str) -> Option<&CredentialEntry> {
        self.entries
            .get(username)
            .filter(|entry| entry.password_matches(password))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Constant-time comparison of two byte slices.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.iter().zip(b).fold(0u8, |diff, (x, y)| diff | (x ^ y)) == 0
}
