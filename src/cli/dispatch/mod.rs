//! Maps validated CLI matches to the action the binary executes.

use crate::cli::{
    actions::{scan, Action},
    commands::{self, auth, backend, station},
    globals::GlobalArgs,
};
use anyhow::{bail, Result};
use std::time::Duration;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let mut globals = GlobalArgs::new(backend::parse(matches)?, station::parse(matches));
    globals.set_token(auth::parse(matches));

    match matches.subcommand() {
        Some((commands::CMD_SETUP, _)) => Ok(Action::Setup(globals)),
        Some((commands::CMD_SCAN, sub_m)) => {
            let release_delay = sub_m
                .get_one::<u64>(commands::ARG_RELEASE_DELAY_MS)
                .copied()
                .map_or(Duration::from_millis(300), Duration::from_millis);
            Ok(Action::Scan(scan::Args {
                globals,
                release_delay,
            }))
        }
        Some((commands::CMD_LOGOUT, _)) => Ok(Action::Logout(globals)),
        _ => bail!("missing subcommand: setup, scan or logout"),
    }
}
