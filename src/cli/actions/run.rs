use crate::cli::actions::{check, login, Action};
use anyhow::Result;

/// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Check(args) => check::execute(&args),
        Action::Login(args) => login::execute(args).await,
    }
}
