use crate::{
    config::IdentityConfig,
    error::AuthError,
    remote::{
        types::{GroupBody, TransactionBody},
        GroupMembership, IdentityProvider, PushPollResult, Transaction,
    },
};
use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use url::Url;

/// HTTP implementation of [`IdentityProvider`].
///
/// The request timeout configured on the client bounds every call on its own,
/// independent of any push polling deadline.
#[derive(Debug, Clone)]
pub struct HttpIdentityClient {
    client: Client,
    config: Arc<IdentityConfig>,
}

impl HttpIdentityClient {
    /// # Errors
    /// Returns `AuthError::Configuration` if the HTTP client cannot be built.
    pub fn new(config: Arc<IdentityConfig>) -> Result<Self, AuthError> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| AuthError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn groups_url(&self, subject_id: &str) -> Result<Url, AuthError> {
        let api = self.config.api_url().ok_or_else(|| {
            AuthError::Configuration("identity provider API URL not configured".to_string())
        })?;
        let mut url = Url::parse(&api)
            .map_err(|e| AuthError::Configuration(format!("invalid API URL {api}: {e}")))?;

        url.path_segments_mut()
            .map_err(|()| AuthError::Configuration(format!("invalid API URL {api}")))?
            .pop_if_empty()
            .push("users")
            .push(subject_id)
            .push("groups");

        Ok(url)
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityClient {
    #[instrument(skip(self, password))]
    async fn start_transaction(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Option<Transaction>, AuthError> {
        let authn_url = self.config.authn_url().ok_or_else(|| {
            AuthError::Configuration("identity provider authn URL not configured".to_string())
        })?;

        let payload = json!({
            "username": username,
            "password": password.expose_secret(),
        });

        let response = self
            .client
            .post(&authn_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AuthError::remote_transport(&authn_url, &e))?;

        let body: Option<TransactionBody> = read_json(&authn_url, response).await?;

        Ok(body.map(Transaction::from))
    }

    #[instrument(skip(self, state_token))]
    async fn advance_challenge(
        &self,
        url: &str,
        state_token: &SecretString,
    ) -> Result<PushPollResult, AuthError> {
        let payload = json!({ "stateToken": state_token.expose_secret() });

        let response = self
            .client
            .post(url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AuthError::remote_transport(url, &e))?;

        let body: Option<TransactionBody> = read_json(url, response).await?;

        body.map(PushPollResult::from)
            .ok_or_else(|| AuthError::RemoteUnavailable {
                status: None,
                detail: format!("{url} - empty challenge response"),
            })
    }

    #[instrument(skip(self))]
    async fn list_groups(&self, subject_id: &str) -> Result<Vec<GroupMembership>, AuthError> {
        let token = self.config.api_token().ok_or_else(|| {
            AuthError::Configuration("AUTHGATE_API_TOKEN required for group lookup".to_string())
        })?;

        let url = self.groups_url(subject_id)?;

        let response = self
            .client
            .get(url.as_str())
            .header(AUTHORIZATION, format!("SSWS {}", token.expose_secret()))
            .send()
            .await
            .map_err(|e| AuthError::remote_transport(url.as_str(), &e))?;

        let groups: Option<Vec<GroupBody>> = read_json(url.as_str(), response).await?;

        let groups: Vec<GroupMembership> = groups
            .unwrap_or_default()
            .into_iter()
            .map(GroupMembership::from)
            .collect();

        debug!("subject {} belongs to {} groups", subject_id, groups.len());

        Ok(groups)
    }
}

/// Decode a JSON response; an empty or `null` body decodes to `None`.
async fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<Option<T>, AuthError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| AuthError::remote_transport(url, &e))?;

    if !status.is_success() {
        let summary = error_summary(&text);

        error!("{} - {}, {}", url, status, summary);

        return Err(AuthError::remote_status(url, status, &summary));
    }

    if text.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str::<Option<T>>(&text).map_err(|e| AuthError::RemoteUnavailable {
        status: Some(status.as_u16()),
        detail: format!("{url} - invalid response body: {e}"),
    })
}

/// Pull the provider's error summary out of an error body, falling back to the raw text.
fn error_summary(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|json| {
            json["errorSummary"]
                .as_str()
                .or_else(|| json["errors"][0].as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.chars().take(200).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::remote::{FactorResult, FactorType, TransactionState};
    use anyhow::Result;
    use serde_json::json;
    use std::net::TcpListener;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn client_for(server: &MockServer, token: Option<&str>) -> HttpIdentityClient {
        let mut config = IdentityConfig::new()
            .with_org_url(server.uri())
            .with_issuer(format!("{}/oauth2/default", server.uri()))
            .with_client_id("client")
            .with_audience("api://default");
        if let Some(token) = token {
            config = config.with_api_token(SecretString::from(token.to_string()));
        }
        HttpIdentityClient::new(Arc::new(config)).unwrap()
    }

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[tokio::test]
    async fn start_transaction_posts_credentials() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/authn"))
            .and(body_json(json!({ "username": "alice", "password": "pw" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "SUCCESS",
                "_embedded": { "user": { "id": "00u1" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let tx = client.start_transaction("alice", &secret("pw")).await?;
        let tx = tx.unwrap();
        assert_eq!(tx.state, TransactionState::Success);
        assert_eq!(tx.subject_id.as_deref(), Some("00u1"));
        Ok(())
    }

    #[tokio::test]
    async fn start_transaction_empty_body_is_none() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/authn"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        assert!(client.start_transaction("alice", &secret("pw")).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn start_transaction_non_success_is_remote_unavailable() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/authn"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "errorCode": "E0000004",
                "errorSummary": "Authentication failed"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let result = client.start_transaction("alice", &secret("bad")).await;
        match result {
            Err(AuthError::RemoteUnavailable { status, detail }) => {
                assert_eq!(status, Some(401));
                assert!(detail.contains("Authentication failed"), "{detail}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn start_transaction_network_failure_is_remote_unavailable() {
        let config = IdentityConfig::new().with_authn_url("http://127.0.0.1:1/api/v1/authn");
        let client = HttpIdentityClient::new(Arc::new(config)).unwrap();
        let result = client.start_transaction("alice", &secret("pw")).await;
        assert!(matches!(
            result,
            Err(AuthError::RemoteUnavailable { status: None, .. })
        ));
    }

    #[tokio::test]
    async fn start_transaction_decodes_push_factor() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/authn"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "MFA_REQUIRED",
                "stateToken": "st-1",
                "_embedded": {
                    "factors": [{
                        "factorType": "push",
                        "provider": "OKTA",
                        "_links": { "verify": { "href": "/api/v1/authn/factors/f1/verify" } }
                    }]
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let tx = client.start_transaction("alice", &secret("pw")).await?.unwrap();
        let TransactionState::ChallengeRequired(factors) = tx.state else {
            panic!("expected challenge");
        };
        assert_eq!(factors[0].factor_type, FactorType::Push);
        assert!(tx.state_token.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn advance_challenge_posts_state_token() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/authn/factors/f1/verify"))
            .and(body_json(json!({ "stateToken": "st-1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "MFA_CHALLENGE",
                "factorResult": "WAITING"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let url = format!("{}/api/v1/authn/factors/f1/verify", server.uri());
        let poll = client.advance_challenge(&url, &secret("st-1")).await?;
        assert_eq!(poll.factor_result, FactorResult::Pending);
        assert_eq!(poll.raw_factor_result.as_deref(), Some("WAITING"));
        Ok(())
    }

    #[tokio::test]
    async fn list_groups_sends_management_token() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/users/00u1/groups"))
            .and(header("Authorization", "SSWS mgmt-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "profile": { "name": "Everyone" } },
                { "profile": { "name": "ReadUsers" } },
                { "profile": {} }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("mgmt-token"));
        let groups = client.list_groups("00u1").await?;
        let names: Vec<_> = groups.into_iter().filter_map(|g| g.name).collect();
        assert_eq!(names, vec!["Everyone".to_string(), "ReadUsers".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn list_groups_without_token_is_configuration_error() -> Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;
        let client = client_for(&server, None);
        let result = client.list_groups("00u1").await;
        assert!(matches!(result, Err(AuthError::Configuration(_))));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
        Ok(())
    }

    #[test]
    fn error_summary_prefers_provider_summary() {
        assert_eq!(
            error_summary(r#"{"errorSummary":"Authentication failed"}"#),
            "Authentication failed"
        );
        assert_eq!(error_summary(r#"{"errors":["denied"]}"#), "denied");
        assert_eq!(error_summary("bad gateway"), "bad gateway");
    }
}
