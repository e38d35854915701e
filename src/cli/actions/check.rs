use crate::config::IdentityConfig;
use anyhow::{anyhow, Result};
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub config: IdentityConfig,
}

/// Print the redacted configuration report.
///
/// # Errors
/// Returns an error when required settings are missing.
pub fn execute(args: &Args) -> Result<()> {
    let report = args.config.validate();

    println!("{}", serde_json::to_string_pretty(&report)?);

    for warning in &report.warnings {
        warn!("{} not set", warning);
    }

    if report.is_valid() {
        Ok(())
    } else {
        Err(anyhow!(
            "missing required settings: {}",
            report.missing.join(", ")
        ))
    }
}
