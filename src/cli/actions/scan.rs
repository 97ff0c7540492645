//! Terminal scan station. A hand-held scanner in keyboard-wedge mode types
//! each pass id followed by Enter; the volunteer answers the confirmation
//! prompt on the same input.

use crate::{
    api::CheckinApi,
    cli::{actions::setup::SIGN_IN_REQUIRED, globals::GlobalArgs},
    scan::{attendee_rows, Modal, ScanController, ScanState},
    scanner::{CaptureSurface, KeyboardWedge, ScanConfig},
    session::{self, GateOutcome, Route},
    station::StationAssignment,
};
use anyhow::{bail, Context, Result};
use std::{
    io::{self, Write},
    time::Duration,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub release_delay: Duration,
}

/// Run the scan station until stdin closes or Ctrl-C.
/// # Errors
/// Returns an error if the scan view cannot be entered or stdin fails.
pub async fn execute(args: Args) -> Result<()> {
    let client = args.globals.backend_client()?;
    let identity = args.globals.identity(&client);
    let store = args.globals.station_store();

    let context = match session::enter_scan_view(&identity, &store).await {
        GateOutcome::Ready(context) => context,
        GateOutcome::Redirect(Route::Login) => bail!(SIGN_IN_REQUIRED),
        GateOutcome::Redirect(_) => bail!("No station assigned. Run `checkin setup` first."),
    };

    let config = ScanConfig {
        release_delay: args.release_delay,
        ..ScanConfig::default()
    };
    let wedge = KeyboardWedge::new();
    let mut controller = ScanController::new(context, client, wedge.clone(), config);

    let mut out = io::stdout();
    render_banner(&mut out, &controller.context().assignment)?;
    controller.init().await;
    render(&mut out, controller.state())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read scanner input")?,
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        if handle_line(&mut controller, &wedge, &line).await {
            render(&mut out, controller.state())?;
        }
    }

    controller.teardown().await;
    info!("scan station closed");
    Ok(())
}

/// What an input line means in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Feed,
    Confirm,
    Dismiss,
    Refresh,
    Ignore,
}

fn step_for(state: &ScanState, line: &str) -> Step {
    match state {
        ScanState::Scanning => Step::Feed,
        ScanState::Modal(Modal::Confirm { .. }) if is_yes(line) => Step::Confirm,
        // Only Enter dismisses; a repeated scan must not end the cycle.
        ScanState::Modal(modal) if modal.is_resolved() && line.trim().is_empty() => {
            Step::Dismiss
        }
        ScanState::CameraUnavailable { .. } if line.trim().eq_ignore_ascii_case("r") => {
            Step::Refresh
        }
        _ => Step::Ignore,
    }
}

/// Routes one input line according to what the station shows. Returns whether
/// the state may have changed.
async fn handle_line<A, S>(
    controller: &mut ScanController<A, S>,
    wedge: &KeyboardWedge,
    line: &str,
) -> bool
where
    A: CheckinApi,
    S: CaptureSurface,
{
    match step_for(controller.state(), line) {
        Step::Feed => wedge.feed(line) && controller.process_pending().await > 0,
        Step::Confirm => {
            controller.confirm().await;
            true
        }
        Step::Dismiss => {
            controller.dismiss().await;
            true
        }
        Step::Refresh => {
            controller.refresh().await;
            true
        }
        Step::Ignore => false,
    }
}

fn is_yes(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

fn render_banner(out: &mut impl Write, assignment: &StationAssignment) -> io::Result<()> {
    writeln!(out, "QR Scanner")?;
    writeln!(out, "Volunteer: {}", assignment.volunteer_name)?;
    writeln!(out, "Station: {}", assignment.station)?;
    out.flush()
}

fn render(out: &mut impl Write, state: &ScanState) -> io::Result<()> {
    match state {
        ScanState::Scanning => writeln!(out, "Point the scanner at a QR code.")?,
        ScanState::Stopped | ScanState::Resolving(_) => {}
        ScanState::CameraUnavailable { message } => {
            writeln!(out, "{message}")?;
            writeln!(out, "Type r and press Enter to retry.")?;
        }
        ScanState::Modal(modal) => render_modal(out, modal)?,
    }
    out.flush()
}

fn render_modal(out: &mut impl Write, modal: &Modal) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "== {} ==", modal.heading())?;

    if let Some(attendee) = modal.attendee() {
        for (label, value) in attendee_rows(attendee) {
            writeln!(out, "  {label:<11} {value}")?;
        }
        if matches!(modal, Modal::Loading { .. }) {
            writeln!(out, "Confirming...")?;
        } else {
            writeln!(out, "Confirm check-in? [y/N]")?;
        }
    }

    if let Some(result) = modal.result() {
        writeln!(out, "{}", result.title)?;
        writeln!(out, "{}", result.message)?;
        writeln!(out, "Press Enter to scan the next pass.")?;
    }

    Ok(())
}
