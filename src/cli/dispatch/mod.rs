//! Map validated CLI matches to an [`Action`].

use crate::cli::{
    actions::{check, login, Action},
    commands::{identity, ARG_PASSWORD, ARG_REQUIRE, ARG_USERNAME, CMD_CHECK, CMD_LOGIN},
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if the subcommand is unknown or a required argument is missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((CMD_CHECK, sub)) => {
            let options = identity::Options::parse(sub)?;
            Ok(Action::Check(check::Args {
                config: options.config,
            }))
        }
        Some((CMD_LOGIN, sub)) => {
            let options = identity::Options::parse(sub)?;

            let username = sub
                .get_one::<String>(ARG_USERNAME)
                .cloned()
                .context("missing required argument: --username")?;
            let password = sub
                .get_one::<String>(ARG_PASSWORD)
                .cloned()
                .context("missing required argument: --password")?;

            Ok(Action::Login(login::Args {
                config: options.config,
                push: options.push,
                credentials_file: options.credentials_file,
                username,
                password: SecretString::from(password),
                require: sub.get_one::<String>(ARG_REQUIRE).cloned(),
            }))
        }
        Some((other, _)) => Err(anyhow!("unknown subcommand: {other}")),
        None => Err(anyhow!("missing subcommand")),
    }
}
