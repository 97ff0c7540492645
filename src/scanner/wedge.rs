//! Keyboard-wedge scanner: hand-held QR scanners that type the decoded text
//! followed by Enter. The terminal station feeds each input line through
//! [`KeyboardWedge::feed`]; the line reaches the controller only while a
//! binding is scanning, like frames of a camera that is switched off.

use super::{
    CaptureSurface, Decoder, DecoderError, DecoderEvent, DecoderEvents, DecoderState, FacingMode,
    ScanConfig,
};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, PoisonError,
};
use tracing::{debug, trace};

/// Reported for blank lines, so stray Enter presses look like any other
/// frame without a code.
const BLANK_LINE: &str = "NotFoundException: No MultiFormat Readers were able to detect the code.";

#[derive(Debug, Default)]
struct Tap {
    binding: u64,
    events: Option<DecoderEvents>,
}

#[derive(Debug, Clone, Default)]
pub struct KeyboardWedge {
    tap: Arc<Mutex<Tap>>,
    bindings: Arc<AtomicU64>,
}

impl KeyboardWedge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forwards one scanned line to the running binding. Returns `false` when
    /// no binding is scanning and the line was discarded.
    pub fn feed(&self, line: &str) -> bool {
        let tap = self.tap.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(events) = &tap.events else {
            trace!("scanner idle, discarding input");
            return false;
        };

        let code = line.trim();
        let event = if code.is_empty() {
            DecoderEvent::Error(BLANK_LINE.to_string())
        } else {
            DecoderEvent::Decoded(code.to_string())
        };

        events.send(event).is_ok()
    }

    /// Whether a binding is currently accepting input.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.tap
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .events
            .is_some()
    }
}

impl CaptureSurface for KeyboardWedge {
    type Decoder = WedgeDecoder;

    async fn mount(&self) -> Result<WedgeDecoder, DecoderError> {
        let binding = self.bindings.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(binding, "keyboard wedge surface mounted");
        Ok(WedgeDecoder {
            tap: Arc::clone(&self.tap),
            binding,
            state: DecoderState::NotStarted,
        })
    }
}

/// One binding of the keyboard wedge.
#[derive(Debug)]
pub struct WedgeDecoder {
    tap: Arc<Mutex<Tap>>,
    binding: u64,
    state: DecoderState,
}

impl Decoder for WedgeDecoder {
    async fn start(
        &mut self,
        _facing: FacingMode,
        _config: &ScanConfig,
        events: DecoderEvents,
    ) -> Result<(), DecoderError> {
        if self.state == DecoderState::Scanning {
            return Err(DecoderError::AlreadyScanning);
        }

        let mut tap = self.tap.lock().unwrap_or_else(PoisonError::into_inner);
        tap.binding = self.binding;
        tap.events = Some(events);
        self.state = DecoderState::Scanning;
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), DecoderError> {
        if self.state != DecoderState::Scanning {
            return Err(DecoderError::NotScanning);
        }

        self.detach();
        self.state = DecoderState::Stopped;
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), DecoderError> {
        if self.state == DecoderState::Scanning {
            return Err(DecoderError::Surface(
                "cannot clear while scanning".to_string(),
            ));
        }
        self.state = DecoderState::NotStarted;
        Ok(())
    }

    fn state(&self) -> DecoderState {
        self.state
    }
}

impl WedgeDecoder {
    // A late stop of an old binding must not detach its successor.
    fn detach(&self) {
        let mut tap = self.tap.lock().unwrap_or_else(PoisonError::into_inner);
        if tap.binding == self.binding {
            tap.events = None;
        }
    }
}
