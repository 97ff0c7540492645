use crate::{
    api::{ApiError, BackendClient, BackendConfig},
    identity::SupabaseAuth,
    station::FileStationStore,
};
use secrecy::SecretString;
use std::path::PathBuf;

/// Settings shared by every subcommand.
#[derive(Clone)]
pub struct GlobalArgs {
    pub backend: BackendConfig,
    pub access_token: Option<SecretString>,
    pub station_file: PathBuf,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(backend: BackendConfig, station_file: PathBuf) -> Self {
        Self {
            backend,
            access_token: None,
            station_file,
        }
    }

    pub fn set_token(&mut self, token: Option<SecretString>) {
        self.access_token = token;
    }

    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn backend_client(&self) -> Result<BackendClient, ApiError> {
        BackendClient::new(self.backend.clone())
    }

    #[must_use]
    pub fn identity(&self, client: &BackendClient) -> SupabaseAuth {
        SupabaseAuth::new(client.clone(), self.access_token.clone())
    }

    #[must_use]
    pub fn station_store(&self) -> FileStationStore {
        FileStationStore::new(self.station_file.clone())
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("backend", &self.backend.base_url.as_str())
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("station_file", &self.station_file)
            .finish()
    }
}
