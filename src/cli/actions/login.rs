use crate::{
    authenticator::Authenticator,
    config::IdentityConfig,
    credentials::CredentialStore,
    gate::{AuthorizationGate, Decision},
    mfa::PushSettings,
    remote::HttpIdentityClient,
};
use anyhow::{anyhow, Context, Result};
use axum::response::{IntoResponse, Response};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::{path::PathBuf, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub config: IdentityConfig,
    pub push: PushSettings,
    pub credentials_file: Option<PathBuf>,
    pub username: String,
    pub password: SecretString,
    pub require: Option<String>,
}

/// Authenticate, print the permission summary and, when asked, the gate decision.
///
/// # Errors
/// Returns an error if setup fails, authentication is refused or the required
/// permission is missing.
pub async fn execute(args: Args) -> Result<()> {
    let store = match &args.credentials_file {
        Some(path) => CredentialStore::from_json_file(path)?,
        None => CredentialStore::with_defaults(),
    };
    debug!("loaded {} local credential entries", store.len());

    let config = Arc::new(args.config);
    let client = HttpIdentityClient::new(config.clone())?;
    let authenticator = Authenticator::new(config, Arc::new(store), Arc::new(client), args.push)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling login");
            on_interrupt.cancel();
        }
    });

    let result = authenticator
        .authenticate_with_cancel(&args.username, &args.password, &cancel)
        .await;
    interrupt.abort();

    let identity = match result {
        Ok(identity) => identity,
        Err(err) => {
            let response = http_view(err.clone().into_response()).await?;
            println!("{}", serde_json::to_string_pretty(&json!({ "response": response }))?);
            return Err(err).with_context(|| format!("login failed for {}", args.username));
        }
    };

    let gate = AuthorizationGate::default();
    let summary = gate.resolver().summarize(Some(&identity));

    let Some(permission) = args.require else {
        println!("{}", serde_json::to_string_pretty(&json!({ "identity": summary }))?);
        return Ok(());
    };

    let decision = gate.require_permission(Some(&identity), &permission);
    let mut report = json!({
        "identity": summary,
        "required": permission,
        "allowed": decision.is_allowed(),
    });

    if let Decision::Deny(reason) = &decision {
        report["response"] = http_view(reason.clone().into_response()).await?;
    }
    println!("{}", serde_json::to_string_pretty(&report)?);

    match decision {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(anyhow!(reason)),
    }
}

/// Status and JSON body an HTTP caller would receive for the same outcome.
async fn http_view(response: Response) -> Result<Value> {
    let status = response.status().as_u16();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;

    Ok(json!({
        "status": status,
        "body": serde_json::from_slice::<Value>(&body)?,
    }))
}
