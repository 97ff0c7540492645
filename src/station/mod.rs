//! Ephemeral station assignment storage. The assignment is written once at
//! setup, read once when the scan view opens and removed on logout.

use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StationAssignment {
    pub volunteer_name: String,
    pub station: String,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("station store I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("station store is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait StationStore: Send + Sync {
    /// # Errors
    /// Returns an error if the stored assignment cannot be read.
    fn load(&self) -> Result<Option<StationAssignment>, StoreError>;

    /// # Errors
    /// Returns an error if the assignment cannot be written.
    fn save(&self, assignment: &StationAssignment) -> Result<(), StoreError>;

    /// # Errors
    /// Returns an error if an existing assignment cannot be removed.
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-process store, lives as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStationStore {
    slot: Mutex<Option<StationAssignment>>,
}

impl MemoryStationStore {
    #[must_use]
    pub fn with(assignment: StationAssignment) -> Self {
        Self {
            slot: Mutex::new(Some(assignment)),
        }
    }
}

impl StationStore for MemoryStationStore {
    fn load(&self) -> Result<Option<StationAssignment>, StoreError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, assignment: &StationAssignment) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(assignment.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// JSON file store used by the terminal station between `setup` and `scan`.
#[derive(Debug, Clone)]
pub struct FileStationStore {
    path: PathBuf,
}

impl FileStationStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<tmp>/checkin/station.json`
    #[must_use]
    pub fn default_path() -> PathBuf {
        std::env::temp_dir().join("checkin").join("station.json")
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StationStore for FileStationStore {
    fn load(&self) -> Result<Option<StationAssignment>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, assignment: &StationAssignment) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(assignment)?)?;
        debug!("station assignment written to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
