//! Local snapshot of the loaded dataset.
//!
//! One JSON file holds the whole record list. A new import replaces it
//! wholesale; nothing is merged.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::ShipmentRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DataSource {
    Sample { seed: u64 },
    Upload { file: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub id: Uuid,
    pub source: DataSource,
    pub loaded_at: DateTime<Utc>,
    pub records: Vec<ShipmentRecord>,
}

impl Dataset {
    pub fn new(source: DataSource, records: Vec<ShipmentRecord>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            loaded_at: Utc::now(),
            records,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatasetStore {
    path: PathBuf,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes to a sibling temp file and renames it over the snapshot.
    pub fn save(&self, dataset: &Dataset) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(dataset)?;
        fs::write(&tmp, body).map_err(|e| Error::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::io(&self.path, e));
        }

        info!(
            path = %self.path.display(),
            dataset = %dataset.id,
            records = dataset.records.len(),
            "Saved dataset"
        );
        Ok(())
    }

    /// The stored dataset, if any. A snapshot that no longer decodes is
    /// removed and reported as absent.
    pub fn load(&self) -> Result<Option<Dataset>> {
        let body = match fs::read(&self.path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No stored dataset");
                return Ok(None);
            }
            Err(e) => return Err(Error::io(&self.path, e)),
        };

        match serde_json::from_slice::<Dataset>(&body) {
            Ok(dataset) => {
                debug!(dataset = %dataset.id, records = dataset.records.len(), "Loaded dataset");
                Ok(Some(dataset))
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable dataset snapshot");
                self.clear()?;
                Ok(None)
            }
        }
    }

    /// Returns whether a snapshot was removed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::io(&self.path, e)),
        }
    }
}
