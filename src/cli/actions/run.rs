use crate::cli::actions::{logout, scan, setup, Action};
use anyhow::Result;

/// Execute the provided action.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Setup(globals) => setup::execute(globals).await,
        Action::Scan(args) => scan::execute(args).await,
        Action::Logout(globals) => logout::execute(globals).await,
    }
}
