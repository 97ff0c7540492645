use thiserror::Error;

/// Failures of the backend calls. The `Display` text is what the station shows
/// to the volunteer, so variants carry user-facing wording.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Unable to reach the server: {0}")]
    Network(String),
    #[error("Request timed out. Please try again.")]
    Timeout,
    /// Non-success status with a sanitized response body.
    #[error("Server returned {status}: {body}")]
    Http { status: u16, body: String },
    /// Non-success status where the server explained itself (e.g. "Already checked in").
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Invalid response format from {endpoint}")]
    InvalidResponse { endpoint: &'static str },
    #[error("Unauthorized ({status})")]
    Unauthorized { status: u16 },
}

impl ApiError {
    /// HTTP status attached to the error, if the server answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. }
            | Self::Rejected { status, .. }
            | Self::Unauthorized { status } => Some(*status),
            _ => None,
        }
    }

    /// Whether the request never produced a usable response.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout)
    }
}

/// Maps reqwest failures into `ApiError` with timeout detection.
pub(crate) fn map_request_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(err.to_string())
    }
}
