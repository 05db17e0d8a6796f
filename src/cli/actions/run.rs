use crate::cli::actions::{auth, backend, gateway, Action};
use anyhow::Result;

/// Execute the provided action.
// This is the single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Auth(args) => auth::execute(args).await,
        Action::Gateway(args) => gateway::execute(args).await,
        Action::Backend(args) => backend::execute(args).await,
    }
}
