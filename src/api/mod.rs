//! Client for the check-in backend functions.
//!
//! Every call carries the project's `apikey` header and the volunteer's bearer
//! credential. Lookup is read-only; commit has side effects on the server and
//! is never retried here.

pub mod config;
pub mod errors;
pub mod types;

pub use config::{BackendConfig, DEFAULT_TIMEOUT};
pub use errors::ApiError;
pub use types::{AttendeeRecord, CommitReceipt, PassId, PassLookup, VolunteerInfo};

use crate::APP_USER_AGENT;
use errors::map_request_error;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::future::Future;
use tracing::{debug, instrument};
use types::{CommitFailureBody, MarkPresentRequest, PassLookupBody};

pub const LOOKUP_PATH: &str = "/functions/v1/get-student-info-by-pass";
pub const COMMIT_PATH: &str = "/functions/v1/mark-present";
pub const VOLUNTEER_PATH: &str = "/functions/v1/get-volunteer-info";

/// Maximum number of error body characters surfaced to the volunteer.
const MAX_ERROR_CHARS: usize = 200;

/// Remote operations the station depends on.
pub trait CheckinApi: Send + Sync {
    /// Resolves a pass id to attendee details.
    ///
    /// # Errors
    /// Non-2xx responses, transport failures and malformed JSON.
    fn lookup_pass(
        &self,
        pass_id: &PassId,
        token: &SecretString,
    ) -> impl Future<Output = Result<PassLookup, ApiError>> + Send;

    /// Marks the attendee holding `pass_id` as present.
    ///
    /// # Errors
    /// `ApiError::Rejected` carries the server's reason ("Already checked in",
    /// "Not registered", ...); transport failures are reported as such.
    fn mark_present(
        &self,
        pass_id: &PassId,
        token: &SecretString,
    ) -> impl Future<Output = Result<CommitReceipt, ApiError>> + Send;

    /// Fetches the volunteer's name and station.
    ///
    /// # Errors
    /// `ApiError::Unauthorized` on 401/403, other failures otherwise.
    fn volunteer_info(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<VolunteerInfo, ApiError>> + Send;
}

/// reqwest-backed implementation of [`CheckinApi`].
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    config: BackendConfig,
}

impl BackendClient {
    /// # Errors
    /// Returns `ApiError::Config` if the HTTP client cannot be built.
    pub fn new(config: BackendConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self { http, config })
    }

    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Builds a request with the project headers and, when given, the bearer credential.
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        token: Option<&SecretString>,
    ) -> RequestBuilder {
        let url = config::build_url_with_base(self.config.base_url.as_str(), path);
        let builder = self
            .http
            .request(method, url)
            .header("apikey", self.config.anon_key.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }
}

impl CheckinApi for BackendClient {
    #[instrument(skip(self, token))]
    async fn lookup_pass(
        &self,
        pass_id: &PassId,
        token: &SecretString,
    ) -> Result<PassLookup, ApiError> {
        let response = self
            .request(Method::GET, LOOKUP_PATH, Some(token))
            .query(&[("pass_id", pass_id.as_str())])
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: sanitize_body(&body),
            });
        }

        let body = response.bytes().await.map_err(map_request_error)?;
        let parsed: PassLookupBody =
            serde_json::from_slice(&body).map_err(|_| ApiError::InvalidResponse {
                endpoint: "get-student-info-by-pass",
            })?;

        Ok(parsed.into_lookup())
    }

    #[instrument(skip(self, token))]
    async fn mark_present(
        &self,
        pass_id: &PassId,
        token: &SecretString,
    ) -> Result<CommitReceipt, ApiError> {
        let response = self
            .request(Method::POST, COMMIT_PATH, Some(token))
            .json(&MarkPresentRequest {
                pass_id: pass_id.as_str(),
            })
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_request_error)?;

        if status.is_success() {
            return serde_json::from_slice(&body).map_err(|_| ApiError::InvalidResponse {
                endpoint: "mark-present",
            });
        }

        debug!("mark-present rejected with {}", status);

        Err(ApiError::Rejected {
            status: status.as_u16(),
            message: rejection_message(status, &body),
        })
    }

    #[instrument(skip(self, token))]
    async fn volunteer_info(&self, token: &SecretString) -> Result<VolunteerInfo, ApiError> {
        let response = self
            .request(Method::GET, VOLUNTEER_PATH, Some(token))
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: sanitize_body(&body),
            });
        }

        let body = response.bytes().await.map_err(map_request_error)?;
        serde_json::from_slice(&body).map_err(|_| ApiError::InvalidResponse {
            endpoint: "get-volunteer-info",
        })
    }
}

/// Server-supplied `error` text, or a generic message keyed by status.
fn rejection_message(status: StatusCode, body: &[u8]) -> String {
    serde_json::from_slice::<CommitFailureBody>(body)
        .ok()
        .and_then(|failure| failure.error)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("Server error: {}", status.as_u16()))
}

/// Trims and truncates HTTP error bodies before they reach the UI; blank
/// bodies read `Request failed.`.
pub(crate) fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
