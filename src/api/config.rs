//! Backend configuration: the Supabase project URL, its public anon key and
//! the request timeout. The anon key is public by design but still kept in a
//! `SecretString` so it never ends up in logs.

use super::ApiError;
use secrecy::SecretString;
use std::time::Duration;
use url::Url;

/// Default request timeout applied to every backend call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: Url,
    pub anon_key: SecretString,
    pub timeout: Duration,
}

impl BackendConfig {
    /// Builds a config from a raw base URL.
    ///
    /// # Errors
    /// Returns `ApiError::Config` if the URL is empty, unparsable or not http(s).
    pub fn new(base_url: &str, anon_key: SecretString) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            anon_key,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn normalize_base_url(value: &str) -> Result<Url, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Config("backend URL is empty".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|err| ApiError::Config(format!("invalid backend URL {trimmed}: {err}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ApiError::Config(format!(
            "unsupported backend URL scheme: {scheme}"
        ))),
    }
}

/// Joins a base URL and a path without doubling or dropping the separator.
pub(crate) fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}
