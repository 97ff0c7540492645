//! Decoder capability.
//!
//! A [`CaptureSurface`] mounts a fresh capture surface and hands back a
//! [`Decoder`] bound to it. The decoder pushes [`DecoderEvent`]s into the
//! channel it was started with; it may report the same code several times in
//! a row (one event per camera frame) and emits a steady stream of "no code in
//! this frame" errors while idle. Filtering and duplicate suppression belong to
//! the scan controller, not to the decoder.

pub mod wedge;

pub use wedge::{KeyboardWedge, WedgeDecoder};

use std::{future::Future, time::Duration};
use thiserror::Error;
use tokio::sync::mpsc;

/// Substrings the decoder uses for "nothing recognised in this frame".
const DECODE_NOISE: [&str; 3] = [
    "No MultiFormat Readers",
    "NotFoundException",
    "QR code parse error",
];

/// Sender half handed to a decoder on start.
pub type DecoderEvents = mpsc::UnboundedSender<DecoderEvent>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecoderEvent {
    Decoded(String),
    /// Non-fatal decoder message; most of them are decode noise.
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    #[default]
    NotStarted,
    Scanning,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    User,
    #[default]
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrBox {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub facing: FacingMode,
    pub fps: u32,
    pub qrbox: QrBox,
    /// Pause between tearing down a binding and mounting the next one, so the
    /// camera handle is released before it is requested again.
    pub release_delay: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            fps: 10,
            qrbox: QrBox {
                width: 280,
                height: 280,
            },
            release_delay: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecoderError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
    #[error("decoder is already scanning")]
    AlreadyScanning,
    #[error("decoder is not scanning")]
    NotScanning,
    #[error("capture surface unavailable: {0}")]
    Surface(String),
}

pub trait Decoder: Send {
    /// Starts capture; decoded text and non-fatal errors flow into `events`.
    ///
    /// # Errors
    /// Returns an error if the camera cannot be acquired.
    fn start(
        &mut self,
        facing: FacingMode,
        config: &ScanConfig,
        events: DecoderEvents,
    ) -> impl Future<Output = Result<(), DecoderError>> + Send;

    /// # Errors
    /// Returns an error if the decoder was not scanning.
    fn stop(&mut self) -> impl Future<Output = Result<(), DecoderError>> + Send;

    /// Releases the capture surface.
    ///
    /// # Errors
    /// Returns an error if the surface cannot be cleared.
    fn clear(&mut self) -> impl Future<Output = Result<(), DecoderError>> + Send;

    fn state(&self) -> DecoderState;
}

pub trait CaptureSurface: Send + Sync {
    type Decoder: Decoder;

    /// Inserts a fresh capture surface and resolves once it is available,
    /// returning a decoder bound to it.
    ///
    /// # Errors
    /// Returns an error if the surface never becomes available.
    fn mount(&self) -> impl Future<Output = Result<Self::Decoder, DecoderError>> + Send;
}

/// Whether a decoder error is the expected "no code in this frame" chatter.
#[must_use]
pub fn is_decode_noise(message: &str) -> bool {
    DECODE_NOISE.iter().any(|noise| message.contains(noise))
}
