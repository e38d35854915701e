//! Identity provider configuration.
//!
//! Built once at startup from CLI arguments or environment variables and
//! shared read-only with the authenticator and the remote client. Derived
//! addresses follow the provider layout: the org base is either explicit or the
//! origin of the issuer, transactions start at `{org}/api/v1/authn`, and the
//! management API lives under `{org}/api/v1`.

use secrecy::SecretString;
use serde::Serialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;

pub const SETTING_ISSUER: &str = "AUTHGATE_ISSUER";
pub const SETTING_CLIENT_ID: &str = "AUTHGATE_CLIENT_ID";
pub const SETTING_AUDIENCE: &str = "AUTHGATE_AUDIENCE";
pub const SETTING_API_TOKEN: &str = "AUTHGATE_API_TOKEN";
pub const SETTING_AUTHN_URL: &str = "AUTHGATE_AUTHN_URL or valid AUTHGATE_ISSUER";

#[derive(Clone)]
pub struct IdentityConfig {
    org_url: Option<String>,
    issuer: Option<String>,
    client_id: Option<String>,
    audience: Option<String>,
    api_token: Option<SecretString>,
    authn_url: Option<String>,
    api_url: Option<String>,
    request_timeout: Duration,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            org_url: None,
            issuer: None,
            client_id: None,
            audience: None,
            api_token: None,
            authn_url: None,
            api_url: None,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        }
    }

    #[must_use]
    pub fn with_org_url(mut self, org_url: impl Into<String>) -> Self {
        self.org_url = non_empty(org_url.into());
        self
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = non_empty(issuer.into());
        self
    }

    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = non_empty(client_id.into());
        self
    }

    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = non_empty(audience.into());
        self
    }

    #[must_use]
    pub fn with_api_token(mut self, token: SecretString) -> Self {
        use secrecy::ExposeSecret;
        self.api_token = if token.expose_secret().trim().is_empty() {
            None
        } else {
            Some(token)
        };
        self
    }

    #[must_use]
    pub fn with_authn_url(mut self, authn_url: impl Into<String>) -> Self {
        self.authn_url = non_empty(authn_url.into());
        self
    }

    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = non_empty(api_url.into());
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    #[must_use]
    pub fn audience(&self) -> Option<&str> {
        self.audience.as_deref()
    }

    #[must_use]
    pub fn api_token(&self) -> Option<&SecretString> {
        self.api_token.as_ref()
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Org base address without a trailing slash: explicit, or the issuer's origin.
    #[must_use]
    pub fn org_url(&self) -> Option<String> {
        if let Some(explicit) = &self.org_url {
            return Some(explicit.trim_end_matches('/').to_string());
        }

        let issuer = Url::parse(self.issuer.as_deref()?).ok()?;
        let origin = issuer.origin();
        origin.is_tuple().then(|| origin.ascii_serialization())
    }

    /// Transaction-start address.
    #[must_use]
    pub fn authn_url(&self) -> Option<String> {
        self.authn_url
            .clone()
            .or_else(|| self.org_url().map(|org| format!("{org}/api/v1/authn")))
    }

    /// Management API base address.
    #[must_use]
    pub fn api_url(&self) -> Option<String> {
        self.api_url
            .clone()
            .or_else(|| self.org_url().map(|org| format!("{org}/api/v1")))
    }

    /// Resolve a challenge reference returned by the provider into an absolute
    /// address. Absolute `http(s)` references are used verbatim, anything else
    /// is joined to the org base.
    #[must_use]
    pub fn resolve_url(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }

        let lower = href.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Url::parse(href).ok().map(|_| href.to_string());
        }

        let org = self.org_url()?;
        if href.starts_with('/') {
            Some(format!("{org}{href}"))
        } else {
            Some(format!("{org}/{href}"))
        }
    }

    /// Check required settings. A missing API token is only a warning: local
    /// credentials keep working and remote group lookups fail per request.
    #[must_use]
    pub fn validate(&self) -> ConfigReport {
        let mut missing = Vec::new();
        let mut warnings = Vec::new();

        if self.issuer.is_none() {
            missing.push(SETTING_ISSUER);
        }
        if self.client_id.is_none() {
            missing.push(SETTING_CLIENT_ID);
        }
        if self.audience.is_none() {
            missing.push(SETTING_AUDIENCE);
        }
        if self.api_token.is_none() {
            warnings.push(SETTING_API_TOKEN);
        }
        if self.authn_url().is_none() {
            missing.push(SETTING_AUTHN_URL);
        }

        ConfigReport {
            valid: missing.is_empty(),
            missing,
            warnings,
            config: ConfigSummary {
                org_url: self.org_url(),
                issuer: self.issuer.clone(),
                client_id: set_or_not(self.client_id.is_some()),
                audience: self.audience.clone(),
                api_token: set_or_not(self.api_token.is_some()),
                authn_url: self.authn_url(),
                api_url: self.api_url(),
            },
        }
    }
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("org_url", &self.org_url())
            .field("issuer", &self.issuer)
            .field("client_id", &self.client_id)
            .field("audience", &self.audience)
            .field("api_token", &"***")
            .field("authn_url", &self.authn_url())
            .field("api_url", &self.api_url())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Result of [`IdentityConfig::validate`], safe to print.
#[derive(Clone, Debug, Serialize)]
pub struct ConfigReport {
    pub valid: bool,
    pub missing: Vec<&'static str>,
    pub warnings: Vec<&'static str>,
    pub config: ConfigSummary,
}

impl ConfigReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

/// Redacted view of the configuration.
#[derive(Clone, Debug, Serialize)]
pub struct ConfigSummary {
    pub org_url: Option<String>,
    pub issuer: Option<String>,
    pub client_id: &'static str,
    pub audience: Option<String>,
    pub api_token: &'static str,
    pub authn_url: Option<String>,
    pub api_url: Option<String>,
}

fn set_or_not(present: bool) -> &'static str {
    if present {
        "SET"
    } else {
        "NOT SET"
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
