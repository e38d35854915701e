use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Authentication failures.
///
/// Credential, MFA and token failures deny the request. `RemoteUnavailable`
/// and `Configuration` are operational signals and must not be reported to the
/// caller as a bad password.
#[derive(Clone, Debug, Error)]
pub enum AuthError {
    #[error("missing authorization header")]
    MissingCredentials,
    #[error("unsupported authorization type, use Basic or Bearer")]
    UnsupportedScheme,
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),
    #[error("MFA denied: {0}")]
    MfaDenied(String),
    #[error("MFA push did not complete: {0}")]
    MfaTimeout(String),
    #[error("identity provider unavailable: {detail}")]
    RemoteUnavailable { status: Option<u16>, detail: String },
    #[error("misconfiguration: {0}")]
    Configuration(String),
    #[error("invalid or expired token: {0}")]
    InvalidToken(String),
    #[error("authentication cancelled")]
    Cancelled,
}

impl AuthError {
    /// Remote call answered with a non-success status.
    pub(crate) fn remote_status(url: &str, status: reqwest::StatusCode, summary: &str) -> Self {
        Self::RemoteUnavailable {
            status: Some(status.as_u16()),
            detail: format!("{url} - {status}, {summary}"),
        }
    }

    /// Remote call never produced a usable response.
    pub(crate) fn remote_transport(url: &str, err: &reqwest::Error) -> Self {
        Self::RemoteUnavailable {
            status: err.status().map(|status| status.as_u16()),
            detail: format!("{url} - {err}"),
        }
    }

    /// Short, stable label for logs and response bodies.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::UnsupportedScheme => "unsupported_scheme",
            Self::InvalidCredentials(_) => "invalid_credentials",
            Self::MfaDenied(_) => "mfa_denied",
            Self::MfaTimeout(_) => "mfa_timeout",
            Self::RemoteUnavailable { .. } => "remote_unavailable",
            Self::Configuration(_) => "configuration_error",
            Self::InvalidToken(_) => "invalid_token",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::RemoteUnavailable { .. } => StatusCode::BAD_GATEWAY,
            Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cancelled => StatusCode::REQUEST_TIMEOUT,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    /// Operator-facing failures, logged as errors rather than denials.
    #[must_use]
    pub const fn is_operational(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable { .. } | Self::Configuration(_)
        )
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": "Authentication failed",
            "kind": self.kind(),
            "details": self.to_string(),
        }));

        (self.status_code(), body).into_response()
    }
}
