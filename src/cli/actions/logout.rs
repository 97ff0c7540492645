use crate::{cli::globals::GlobalArgs, session};
use anyhow::Result;

/// Sign out and forget the station assignment.
/// # Errors
/// Returns an error if the HTTP client cannot be built.
pub async fn execute(globals: GlobalArgs) -> Result<()> {
    let client = globals.backend_client()?;
    let identity = globals.identity(&client);
    let store = globals.station_store();

    session::logout(&identity, &store).await;
    println!("Signed out.");

    Ok(())
}
