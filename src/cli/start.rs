use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;

/// Parse arguments, initialize telemetry and return the action to run.
///
/// # Errors
///
/// Returns an error if argument parsing, telemetry initialization, or action dispatch fails
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let verbosity = matches
        .get_one::<u8>(commands::logging::ARG_VERBOSITY)
        .copied()
        .unwrap_or(0);

    telemetry::init(commands::logging::level_for(verbosity))?;

    dispatch::handler(&matches)
}
