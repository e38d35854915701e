//! Scripted [`IdentityProvider`] for unit tests.

use crate::{
    error::AuthError,
    remote::{
        types::{GroupBody, TransactionBody},
        GroupMembership, IdentityProvider, PushPollResult, Transaction,
    },
};
use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;
use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

/// Replays canned provider bodies and counts calls.
///
/// The last queued poll body repeats forever once the queue drains to it.
#[derive(Default)]
pub(crate) struct ScriptedProvider {
    transaction: Option<Value>,
    start_unavailable: bool,
    polls: Mutex<VecDeque<Value>>,
    groups: Vec<Value>,
    pub start_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,
    pub group_calls: AtomicUsize,
    pub poll_urls: Mutex<Vec<String>>,
    pub group_subjects: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_transaction(mut self, body: Value) -> Self {
        self.transaction = Some(body);
        self
    }

    pub(crate) fn with_start_unavailable(mut self) -> Self {
        self.start_unavailable = true;
        self
    }

    pub(crate) fn with_polls(self, bodies: impl IntoIterator<Item = Value>) -> Self {
        if let Ok(mut polls) = self.polls.lock() {
            polls.extend(bodies);
        }
        self
    }

    pub(crate) fn with_groups(mut self, bodies: impl IntoIterator<Item = Value>) -> Self {
        self.groups = bodies.into_iter().collect();
        self
    }

    pub(crate) fn starts(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn polls(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn group_lookups(&self) -> usize {
        self.group_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    async fn start_transaction(
        &self,
        _username: &str,
        _password: &SecretString,
    ) -> Result<Option<Transaction>, AuthError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);

        if self.start_unavailable {
            return Err(AuthError::RemoteUnavailable {
                status: Some(503),
                detail: "scripted outage".to_string(),
            });
        }

        Ok(self.transaction.clone().and_then(|body| {
            serde_json::from_value::<Option<TransactionBody>>(body)
                .ok()
                .flatten()
                .map(Transaction::from)
        }))
    }

    async fn advance_challenge(
        &self,
        url: &str,
        _state_token: &SecretString,
    ) -> Result<PushPollResult, AuthError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut urls) = self.poll_urls.lock() {
            urls.push(url.to_string());
        }

        let body = {
            let mut polls = self
                .polls
                .lock()
                .map_err(|_| AuthError::Configuration("poisoned".to_string()))?;
            if polls.len() > 1 {
                polls.pop_front()
            } else {
                polls.front().cloned()
            }
        };

        let body = body.ok_or_else(|| AuthError::RemoteUnavailable {
            status: None,
            detail: "no scripted poll response".to_string(),
        })?;

        let body: TransactionBody = serde_json::from_value(body).unwrap_or_default();
        Ok(PushPollResult::from(body))
    }

    async fn list_groups(&self, subject_id: &str) -> Result<Vec<GroupMembership>, AuthError> {
        self.group_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut subjects) = self.group_subjects.lock() {
            subjects.push(subject_id.to_string());
        }

        Ok(self
            .groups
            .iter()
            .cloned()
            .filter_map(|body| serde_json::from_value::<GroupBody>(body).ok())
            .map(GroupMembership::from)
            .collect())
    }
}
