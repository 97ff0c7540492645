//! # checkin (event check-in station)
//!
//! `checkin` drives a volunteer's check-in station: the volunteer holds a
//! Supabase-issued bearer credential, is assigned a station, then scans
//! attendee passes and marks them present through two backend functions
//! (`get-student-info-by-pass` and `mark-present`).
//!
//! ## Flow
//!
//! 1. **Setup:** [`session::fetch_assignment`] resolves the volunteer's name and
//!    station, [`session::start_scanning`] stores it in a [`station::StationStore`].
//! 2. **Gate:** [`session::enter_scan_view`] checks that a session and a station
//!    assignment exist, redirecting to login or setup otherwise.
//! 3. **Scan:** [`scan::ScanController`] owns the capture binding, drops duplicate
//!    decodes while a scan cycle is active and drives the confirmation modal.
//!
//! The backend, identity provider and decoder are collaborators behind traits
//! ([`api::CheckinApi`], [`identity::IdentityProvider`], [`scanner::CaptureSurface`])
//! so the controller can run against fakes in tests.

pub mod api;
pub mod cli;
pub mod identity;
pub mod scan;
pub mod scanner;
pub mod session;
pub mod station;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
