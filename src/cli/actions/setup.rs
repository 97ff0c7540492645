use crate::{
    cli::globals::GlobalArgs,
    session::{self, Route, SetupOutcome},
};
use anyhow::{bail, Result};
use tracing::info;

pub const SIGN_IN_REQUIRED: &str =
    "Not signed in. Provide a volunteer access token with --access-token or CHECKIN_ACCESS_TOKEN.";

/// Fetch the volunteer's assignment and store it for `scan`.
/// # Errors
/// Returns an error if the volunteer is not signed in, the details cannot be
/// fetched or the assignment cannot be stored.
pub async fn execute(globals: GlobalArgs) -> Result<()> {
    let client = globals.backend_client()?;
    let identity = globals.identity(&client);
    let store = globals.station_store();

    let assignment = match session::fetch_assignment(&identity, &client).await? {
        SetupOutcome::Assigned(assignment) => assignment,
        SetupOutcome::Redirect { route, notice } => {
            if let Some(notice) = notice {
                eprintln!("{notice}");
            }
            if route == Route::Login {
                bail!(SIGN_IN_REQUIRED);
            }
            bail!("cannot continue setup");
        }
    };

    println!("Volunteer Details");
    println!("  Your Name:      {}", assignment.volunteer_name);
    println!("  Entry Position: {}", assignment.station);

    session::start_scanning(&store, &assignment)?;
    info!(path = %store.path().display(), "station assignment stored");
    println!("Ready. Run `checkin scan` to start scanning.");

    Ok(())
}
