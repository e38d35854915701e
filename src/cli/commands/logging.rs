//! Log verbosity: repeated `-v` flags or `AUTHGATE_LOG_LEVEL`.

use clap::{builder::ValueParser, Arg, ArgAction, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

/// Indexed by verbosity count, so `-vvv` and `AUTHGATE_LOG_LEVEL=debug` agree.
const LEVELS: [(&str, Level); 5] = [
    ("error", Level::ERROR),
    ("warn", Level::WARN),
    ("info", Level::INFO),
    ("debug", Level::DEBUG),
    ("trace", Level::TRACE),
];

fn parse_verbosity(value: &str) -> Result<u8, String> {
    let value = value.trim();

    if let Ok(count) = value.parse::<u8>() {
        return Ok(count);
    }

    LEVELS
        .iter()
        .position(|(name, _)| name.eq_ignore_ascii_case(value))
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| {
            format!("unknown log level '{value}', expected error, warn, info, debug or trace")
        })
}

/// Tracing level for a verbosity count.
///
/// `None` leaves the subscriber on its ERROR default, where `RUST_LOG` still
/// applies. Counts past the table saturate at TRACE.
#[must_use]
pub fn level_for(verbosity: u8) -> Option<Level> {
    match verbosity {
        0 => None,
        count => Some(
            LEVELS
                .get(usize::from(count))
                .map_or(Level::TRACE, |(_, level)| *level),
        ),
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Increase log output; -v warn, -vv info, -vvv debug, -vvvv trace")
            .env("AUTHGATE_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::from(parse_verbosity)),
    )
}
