//! Confirmation modal states and the text each one shows.

use crate::api::{AttendeeRecord, PassId};
use ulid::Ulid;

pub const TITLE_INVALID_CODE: &str = "Invalid QR Code";
pub const TITLE_SCAN_ERROR: &str = "Scan Error";
pub const TITLE_CHECKED_IN: &str = "Check-in Successful!";
pub const TITLE_CHECK_IN_FAILED: &str = "Check-in Failed";

pub const MESSAGE_NO_RECORD: &str = "No student record found for this pass ID.";
pub const MESSAGE_LOOKUP_FAILED: &str = "Failed to fetch student info.";
pub const MESSAGE_COMMIT_FAILED: &str = "Failed to mark attendance.";
pub const MESSAGE_MARKED_PRESENT: &str = "Marked present!";

/// One decode-to-dismiss unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCycle {
    pub id: Ulid,
    pub pass_id: PassId,
}

impl ScanCycle {
    #[must_use]
    pub fn new(pass_id: PassId) -> Self {
        Self {
            id: Ulid::new(),
            pass_id,
        }
    }
}

/// Title and message of a finished cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub title: String,
    pub message: String,
}

impl ScanResult {
    pub(crate) fn new(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }

    /// Uses `fallback` when the description is blank.
    pub(crate) fn describe(title: &str, description: String, fallback: &str) -> Self {
        if description.trim().is_empty() {
            Self::new(title, fallback)
        } else {
            Self::new(title, description)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Confirm {
        cycle: ScanCycle,
        attendee: AttendeeRecord,
    },
    Loading {
        cycle: ScanCycle,
        attendee: AttendeeRecord,
    },
    Success(ScanResult),
    Error(ScanResult),
}

impl Modal {
    /// Modal header.
    #[must_use]
    pub const fn heading(&self) -> &'static str {
        match self {
            Self::Confirm { .. } | Self::Loading { .. } => "Confirm Check-in",
            Self::Success(_) => "Success",
            Self::Error(_) => "Scan Error",
        }
    }

    #[must_use]
    pub fn attendee(&self) -> Option<&AttendeeRecord> {
        match self {
            Self::Confirm { attendee, .. } | Self::Loading { attendee, .. } => Some(attendee),
            Self::Success(_) | Self::Error(_) => None,
        }
    }

    #[must_use]
    pub fn result(&self) -> Option<&ScanResult> {
        match self {
            Self::Success(result) | Self::Error(result) => Some(result),
            Self::Confirm { .. } | Self::Loading { .. } => None,
        }
    }

    /// Whether the single action of this state is "dismiss".
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Error(_))
    }
}

/// Display rows for the confirmation view; missing values read `N/A`.
#[must_use]
pub fn attendee_rows(attendee: &AttendeeRecord) -> [(&'static str, String); 4] {
    let or_na = |value: Option<String>| value.unwrap_or_else(|| "N/A".to_string());
    [
        ("Name", attendee.name.clone()),
        ("Roll No", or_na(attendee.roll_no.clone())),
        ("Department", or_na(attendee.dept.clone())),
        ("Guests", or_na(attendee.guest_count.map(|n| n.to_string()))),
    ]
}
