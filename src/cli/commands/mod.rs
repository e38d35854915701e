pub mod identity;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

pub const CMD_CHECK: &str = "check";
pub const CMD_LOGIN: &str = "login";

pub const ARG_USERNAME: &str = "username";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_REQUIRE: &str = "require";

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("authgate")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(CMD_CHECK).about("Validate identity provider settings and print a redacted report"),
        )
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Authenticate a username/password and print the resolved permissions")
                .arg(
                    Arg::new(ARG_USERNAME)
                        .short('u')
                        .long(ARG_USERNAME)
                        .help("Username to authenticate")
                        .env("AUTHGATE_USERNAME")
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_PASSWORD)
                        .long(ARG_PASSWORD)
                        .help("Password to authenticate")
                        .env("AUTHGATE_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new(ARG_REQUIRE)
                        .short('r')
                        .long(ARG_REQUIRE)
                        .help("Permission the authenticated identity must hold, example: read"),
                ),
        );

    let command = identity::with_args(command);
    logging::with_args(command)
}

/// Environment fixture for `temp_env`: every `AUTHGATE_*` variable unset,
/// except the `overrides`.
#[cfg(test)]
pub(crate) mod test_env {
    const AUTHGATE_ENV: [&str; 14] = [
        "AUTHGATE_ORG_URL",
        "AUTHGATE_ISSUER",
        "AUTHGATE_CLIENT_ID",
        "AUTHGATE_AUDIENCE",
        "AUTHGATE_API_TOKEN",
        "AUTHGATE_AUTHN_URL",
        "AUTHGATE_API_URL",
        "AUTHGATE_REQUEST_TIMEOUT_SECONDS",
        "AUTHGATE_PUSH_TIMEOUT_SECONDS",
        "AUTHGATE_PUSH_INTERVAL_SECONDS",
        "AUTHGATE_CREDENTIALS_FILE",
        "AUTHGATE_LOG_LEVEL",
        "AUTHGATE_USERNAME",
        "AUTHGATE_PASSWORD",
    ];

    pub(crate) fn cleared(
        overrides: &[(&'static str, Option<&'static str>)],
    ) -> Vec<(&'static str, Option<&'static str>)> {
        let mut vars: Vec<_> = AUTHGATE_ENV
            .iter()
            .filter(|name| !overrides.iter().any(|(set, _)| set == *name))
            .map(|name| (*name, None))
            .collect();
        vars.extend_from_slice(overrides);
        vars
    }
}
