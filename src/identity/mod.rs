//! Identity provider seam. The OAuth sign-in itself happens outside the
//! station (the volunteer signs in with Google through Supabase); the station
//! only holds the resulting bearer credential, checks it is still valid and
//! revokes it on logout.

use crate::api::{ApiError, BackendClient};
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde::Deserialize;
use std::future::Future;
use tracing::{debug, instrument, warn};

pub const USER_PATH: &str = "/auth/v1/user";
pub const LOGOUT_PATH: &str = "/auth/v1/logout";

/// An authenticated volunteer session.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: SecretString,
    pub email: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(access_token: SecretString) -> Self {
        Self {
            access_token,
            email: None,
        }
    }
}

pub trait IdentityProvider: Send + Sync {
    /// Returns the current session, or `None` when nobody is signed in.
    ///
    /// # Errors
    /// Returns an error when the provider cannot be reached.
    fn current_session(&self) -> impl Future<Output = Result<Option<Session>, ApiError>> + Send;

    /// Ends the current session.
    ///
    /// # Errors
    /// Returns an error when the provider rejects or cannot process the request.
    fn sign_out(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[derive(Debug, Deserialize)]
struct UserBody {
    email: Option<String>,
}

/// Supabase auth: validates a configured access token against `/auth/v1/user`.
#[derive(Debug, Clone)]
pub struct SupabaseAuth {
    client: BackendClient,
    access_token: Option<SecretString>,
}

impl SupabaseAuth {
    #[must_use]
    pub fn new(client: BackendClient, access_token: Option<SecretString>) -> Self {
        Self {
            client,
            access_token,
        }
    }
}

impl IdentityProvider for SupabaseAuth {
    #[instrument(skip(self))]
    async fn current_session(&self) -> Result<Option<Session>, ApiError> {
        let Some(token) = &self.access_token else {
            debug!("no access token configured");
            return Ok(None);
        };

        let response = self
            .client
            .request(Method::GET, USER_PATH, Some(token))
            .send()
            .await
            .map_err(crate::api::errors::map_request_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("access token rejected: {}", status);
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: crate::api::sanitize_body(&body),
            });
        }

        let user: UserBody = response
            .json()
            .await
            .map_err(|_| ApiError::InvalidResponse { endpoint: "user" })?;

        Ok(Some(Session {
            access_token: token.clone(),
            email: user.email,
        }))
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), ApiError> {
        let Some(token) = &self.access_token else {
            return Ok(());
        };

        let response = self
            .client
            .request(Method::POST, LOGOUT_PATH, Some(token))
            .send()
            .await
            .map_err(crate::api::errors::map_request_error)?;

        let status = response.status();
        // An already revoked token means the session is gone either way.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Http {
                status: status.as_u16(),
                body: crate::api::sanitize_body(&body),
            })
        }
    }
}
