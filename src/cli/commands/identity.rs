//! Identity provider and push settings shared by every subcommand.

use crate::{
    config::{IdentityConfig, DEFAULT_REQUEST_TIMEOUT_SECONDS},
    mfa::{
        push::{DEFAULT_PUSH_INTERVAL_SECONDS, DEFAULT_PUSH_TIMEOUT_SECONDS},
        PushSettings,
    },
};
use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::{path::PathBuf, time::Duration};

pub const ARG_ORG_URL: &str = "org-url";
pub const ARG_ISSUER: &str = "issuer";
pub const ARG_CLIENT_ID: &str = "client-id";
pub const ARG_AUDIENCE: &str = "audience";
pub const ARG_API_TOKEN: &str = "api-token";
pub const ARG_AUTHN_URL: &str = "authn-url";
pub const ARG_API_URL: &str = "api-url";
pub const ARG_REQUEST_TIMEOUT: &str = "request-timeout-seconds";
pub const ARG_PUSH_TIMEOUT: &str = "push-timeout-seconds";
pub const ARG_PUSH_INTERVAL: &str = "push-interval-seconds";
pub const ARG_CREDENTIALS_FILE: &str = "credentials-file";

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_provider_args(command);
    with_push_args(command)
}

fn with_provider_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ORG_URL)
                .long(ARG_ORG_URL)
                .help("Identity provider base URL, derived from the issuer when omitted")
                .env("AUTHGATE_ORG_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_ISSUER)
                .long(ARG_ISSUER)
                .help("Token issuer, example: https://dev-123.okta.com/oauth2/default")
                .env("AUTHGATE_ISSUER")
                .global(true),
        )
        .arg(
            Arg::new(ARG_CLIENT_ID)
                .long(ARG_CLIENT_ID)
                .help("OAuth client id")
                .env("AUTHGATE_CLIENT_ID")
                .global(true),
        )
        .arg(
            Arg::new(ARG_AUDIENCE)
                .long(ARG_AUDIENCE)
                .help("Accepted token audience")
                .env("AUTHGATE_AUDIENCE")
                .global(true),
        )
        .arg(
            Arg::new(ARG_API_TOKEN)
                .long(ARG_API_TOKEN)
                .help("Management API token used for group lookups")
                .env("AUTHGATE_API_TOKEN")
                .hide_env_values(true)
                .global(true),
        )
        .arg(
            Arg::new(ARG_AUTHN_URL)
                .long(ARG_AUTHN_URL)
                .help("Transaction start URL (default: {org}/api/v1/authn)")
                .env("AUTHGATE_AUTHN_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Management API URL (default: {org}/api/v1)")
                .env("AUTHGATE_API_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_REQUEST_TIMEOUT)
                .long(ARG_REQUEST_TIMEOUT)
                .help("Timeout for each identity provider request")
                .env("AUTHGATE_REQUEST_TIMEOUT_SECONDS")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..))
                .global(true),
        )
        .arg(
            Arg::new(ARG_CREDENTIALS_FILE)
                .long(ARG_CREDENTIALS_FILE)
                .help("JSON file with local credentials: [{username, password, groups}]")
                .env("AUTHGATE_CREDENTIALS_FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .global(true),
        )
}

fn with_push_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PUSH_TIMEOUT)
                .long(ARG_PUSH_TIMEOUT)
                .help("How long to wait for a push approval")
                .env("AUTHGATE_PUSH_TIMEOUT_SECONDS")
                .default_value("90")
                .value_parser(clap::value_parser!(u64).range(1..))
                .global(true),
        )
        .arg(
            Arg::new(ARG_PUSH_INTERVAL)
                .long(ARG_PUSH_INTERVAL)
                .help("Delay between push status polls")
                .env("AUTHGATE_PUSH_INTERVAL_SECONDS")
                .default_value("3")
                .value_parser(clap::value_parser!(u64).range(1..))
                .global(true),
        )
}

#[derive(Debug)]
pub struct Options {
    pub config: IdentityConfig,
    pub push: PushSettings,
    pub credentials_file: Option<PathBuf>,
}

impl Options {
    /// # Errors
    /// Returns an error if a value cannot be read from `matches`.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let text = |id: &str| matches.get_one::<String>(id).cloned().unwrap_or_default();
        let seconds = |id: &str, default: u64| {
            Duration::from_secs(matches.get_one::<u64>(id).copied().unwrap_or(default))
        };

        let config = IdentityConfig::new()
            .with_org_url(text(ARG_ORG_URL))
            .with_issuer(text(ARG_ISSUER))
            .with_client_id(text(ARG_CLIENT_ID))
            .with_audience(text(ARG_AUDIENCE))
            .with_api_token(SecretString::from(text(ARG_API_TOKEN)))
            .with_authn_url(text(ARG_AUTHN_URL))
            .with_api_url(text(ARG_API_URL))
            .with_request_timeout(seconds(ARG_REQUEST_TIMEOUT, DEFAULT_REQUEST_TIMEOUT_SECONDS));

        let push = PushSettings::new()
            .with_timeout(seconds(ARG_PUSH_TIMEOUT, DEFAULT_PUSH_TIMEOUT_SECONDS))
            .with_interval(seconds(ARG_PUSH_INTERVAL, DEFAULT_PUSH_INTERVAL_SECONDS));

        Ok(Self {
            config,
            push,
            credentials_file: matches.get_one::<PathBuf>(ARG_CREDENTIALS_FILE).cloned(),
        })
    }
}
