pub mod check;
pub mod login;

mod run;

#[derive(Debug)]
pub enum Action {
    Check(check::Args),
    Login(login::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
