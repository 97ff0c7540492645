//! Scan controller: mediates between the decoder and the backend.
//!
//! The controller is a single tagged state ([`ScanState`]). Only `Scanning`
//! accepts a decode, which makes the state itself the reentrancy guard: the
//! first decode of a cycle moves the controller out of `Scanning` before any
//! asynchronous work, and everything decoded afterwards is dropped until the
//! volunteer dismisses the result. Each capture binding gets its own event
//! channel, so frames of a torn-down binding can never leak into a later cycle.
//!
//! Camera invariant: the decoder is stopped whenever a cycle is active and
//! scanning whenever the controller is idle in `Scanning`.

pub mod modal;
#[cfg(test)]
mod tests;

pub use modal::{attendee_rows, Modal, ScanCycle, ScanResult};

use crate::{
    api::{CheckinApi, PassId, PassLookup},
    identity::Session,
    scanner::{
        is_decode_noise, CaptureSurface, Decoder, DecoderError, DecoderEvent, DecoderState,
        ScanConfig,
    },
    station::StationAssignment,
};
use modal::{
    MESSAGE_COMMIT_FAILED, MESSAGE_LOOKUP_FAILED, MESSAGE_MARKED_PRESENT, MESSAGE_NO_RECORD,
    TITLE_CHECKED_IN, TITLE_CHECK_IN_FAILED, TITLE_INVALID_CODE, TITLE_SCAN_ERROR,
};
use tokio::{sync::mpsc, time::sleep};
use tracing::{debug, error, info, instrument, trace, warn};

pub const CAMERA_DENIED: &str = "Camera access denied. Please refresh and grant access.";
pub const CAMERA_RESTART_FAILED: &str = "Could not restart camera. Please refresh.";

/// Everything the scan view needs from the steps before it.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub session: Session,
    pub assignment: StationAssignment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanState {
    /// Not mounted, torn down, or between bindings during a restart.
    Stopped,
    Scanning,
    /// Lookup in flight; the modal is not open yet.
    Resolving(ScanCycle),
    Modal(Modal),
    /// Page-level camera failure. Not retried automatically.
    CameraUnavailable { message: String },
}

impl ScanState {
    #[must_use]
    pub fn modal(&self) -> Option<&Modal> {
        match self {
            Self::Modal(modal) => Some(modal),
            _ => None,
        }
    }

    /// Whether a scan cycle currently holds the guard.
    #[must_use]
    pub const fn is_cycle_active(&self) -> bool {
        matches!(self, Self::Resolving(_) | Self::Modal(_))
    }
}

pub struct ScanController<A, S: CaptureSurface> {
    context: ScanContext,
    api: A,
    surface: S,
    config: ScanConfig,
    decoder: Option<S::Decoder>,
    events: Option<mpsc::UnboundedReceiver<DecoderEvent>>,
    state: ScanState,
}

impl<A: CheckinApi, S: CaptureSurface> ScanController<A, S> {
    #[must_use]
    pub fn new(context: ScanContext, api: A, surface: S, config: ScanConfig) -> Self {
        Self {
            context,
            api,
            surface,
            config,
            decoder: None,
            events: None,
            state: ScanState::Stopped,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &ScanState {
        &self.state
    }

    #[must_use]
    pub const fn context(&self) -> &ScanContext {
        &self.context
    }

    /// State of the current capture binding, `None` when there is none.
    #[must_use]
    pub fn decoder_state(&self) -> Option<DecoderState> {
        self.decoder.as_ref().map(Decoder::state)
    }

    /// Mounts the capture surface and starts scanning.
    #[instrument(skip_all, fields(station = %self.context.assignment.station))]
    pub async fn init(&mut self) {
        if self.state != ScanState::Stopped {
            debug!("scanner already initialised");
            return;
        }

        match self.bind().await {
            Ok(()) => {
                info!("scanner started");
                self.state = ScanState::Scanning;
            }
            Err(err) => {
                error!("camera start failed: {err}");
                self.state = ScanState::CameraUnavailable {
                    message: CAMERA_DENIED.to_string(),
                };
            }
        }
    }

    /// Stops a running binding and forgets it.
    #[instrument(skip_all)]
    pub async fn teardown(&mut self) {
        self.events = None;
        if let Some(mut decoder) = self.decoder.take() {
            if decoder.state() == DecoderState::Scanning {
                if let Err(err) = decoder.stop().await {
                    debug!("stop on teardown failed: {err}");
                }
            }
        }
        self.state = ScanState::Stopped;
    }

    /// Retries capture after a page-level camera failure.
    pub async fn refresh(&mut self) {
        if !matches!(self.state, ScanState::CameraUnavailable { .. }) {
            debug!("refresh ignored while the camera is available");
            return;
        }
        self.teardown().await;
        self.init().await;
    }

    /// Waits for the next event of the current binding.
    pub async fn next_event(&mut self) -> Option<DecoderEvent> {
        self.events.as_mut()?.recv().await
    }

    /// Handles every event already queued by the decoder, in order.
    pub async fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.events.as_mut().and_then(|rx| rx.try_recv().ok()) {
            handled += 1;
            self.on_decoder_event(event).await;
        }
        handled
    }

    pub async fn on_decoder_event(&mut self, event: DecoderEvent) {
        match event {
            DecoderEvent::Decoded(text) => self.on_decode(PassId::new(text)).await,
            DecoderEvent::Error(message) if is_decode_noise(&message) => {
                trace!("no code in frame");
            }
            DecoderEvent::Error(message) => warn!("QR Error: {message}"),
        }
    }

    /// Starts a scan cycle for `pass_id` unless one is already active.
    #[instrument(skip_all, fields(pass_id = %pass_id))]
    pub async fn on_decode(&mut self, pass_id: PassId) {
        if self.state != ScanState::Scanning {
            debug!("scan cycle active, dropping decode");
            return;
        }

        let cycle = ScanCycle::new(pass_id);
        self.state = ScanState::Resolving(cycle.clone());

        if let Some(decoder) = self.decoder.as_mut() {
            if let Err(err) = decoder.stop().await {
                debug!("stop before lookup failed: {err}");
            }
        }

        let lookup = self
            .api
            .lookup_pass(&cycle.pass_id, &self.context.session.access_token)
            .await;

        let modal = match lookup {
            Ok(PassLookup::Found(attendee)) => {
                info!(cycle = %cycle.id, "attendee found");
                Modal::Confirm { cycle, attendee }
            }
            Ok(PassLookup::NotFound) => {
                warn!(cycle = %cycle.id, "no attendee for pass");
                Modal::Error(ScanResult::new(TITLE_INVALID_CODE, MESSAGE_NO_RECORD))
            }
            Err(err) => {
                error!(cycle = %cycle.id, "lookup failed: {err}");
                Modal::Error(ScanResult::describe(
                    TITLE_SCAN_ERROR,
                    err.to_string(),
                    MESSAGE_LOOKUP_FAILED,
                ))
            }
        };

        self.state = ScanState::Modal(modal);
    }

    /// Commits attendance for the attendee under review. Never retried.
    #[instrument(skip_all)]
    pub async fn confirm(&mut self) {
        let (cycle, attendee) = match std::mem::replace(&mut self.state, ScanState::Stopped) {
            ScanState::Modal(Modal::Confirm { cycle, attendee }) => (cycle, attendee),
            other => {
                debug!("confirm ignored outside the confirm state");
                self.state = other;
                return;
            }
        };

        self.state = ScanState::Modal(Modal::Loading {
            cycle: cycle.clone(),
            attendee: attendee.clone(),
        });

        let commit = self
            .api
            .mark_present(&cycle.pass_id, &self.context.session.access_token)
            .await;

        let modal = match commit {
            Ok(receipt) => {
                info!(cycle = %cycle.id, "attendee marked present");
                let message = receipt
                    .message
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| MESSAGE_MARKED_PRESENT.to_string());
                let student = receipt
                    .student_name
                    .filter(|name| !name.is_empty())
                    .unwrap_or(attendee.name);
                Modal::Success(ScanResult::new(
                    TITLE_CHECKED_IN,
                    format!("{message} (Student: {student})"),
                ))
            }
            Err(err) => {
                warn!(cycle = %cycle.id, "check-in failed: {err}");
                Modal::Error(ScanResult::describe(
                    TITLE_CHECK_IN_FAILED,
                    err.to_string(),
                    MESSAGE_COMMIT_FAILED,
                ))
            }
        };

        self.state = ScanState::Modal(modal);
    }

    /// Closes a resolved modal, ends the cycle and restarts capture.
    #[instrument(skip_all)]
    pub async fn dismiss(&mut self) {
        if !matches!(&self.state, ScanState::Modal(modal) if modal.is_resolved()) {
            debug!("dismiss ignored while no result is shown");
            return;
        }

        self.state = ScanState::Stopped;
        self.restart().await;
    }

    async fn restart(&mut self) {
        self.release().await;

        if !self.config.release_delay.is_zero() {
            sleep(self.config.release_delay).await;
        }

        match self.bind().await {
            Ok(()) => {
                debug!("scanner restarted");
                self.state = ScanState::Scanning;
            }
            Err(err) => {
                error!("camera restart failed: {err}");
                self.state = ScanState::CameraUnavailable {
                    message: CAMERA_RESTART_FAILED.to_string(),
                };
            }
        }
    }

    /// Best-effort teardown of the current binding: stop, then clear.
    async fn release(&mut self) {
        self.events = None;
        if let Some(mut decoder) = self.decoder.take() {
            // Usually already stopped by the decode that opened the cycle.
            if let Err(err) = decoder.stop().await {
                debug!("Stop error: {err}");
            }
            if let Err(err) = decoder.clear().await {
                warn!("Clear error: {err}");
            }
        }
    }

    async fn bind(&mut self) -> Result<(), DecoderError> {
        let mut decoder = self.surface.mount().await?;
        let (events, rx) = mpsc::unbounded_channel();
        decoder.start(self.config.facing, &self.config, events).await?;
        self.decoder = Some(decoder);
        self.events = Some(rx);
        Ok(())
    }
}
