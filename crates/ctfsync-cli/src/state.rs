//! Persisted result of a catalog read.
//!
//! The file is replaced atomically: readers see either the previous snapshot
//! or the new one, never a mix.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use ctfsync_core::{Diagnostics, SchemaMismatch, Snapshot, challenges_schema, conforms};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("state file JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not replace {path}: {source}")]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
    #[error("snapshot does not match the declared schema: {0}")]
    Schema(#[from] SchemaMismatch),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    pub written_at: DateTime<Utc>,
    pub snapshot: Snapshot,
    /// Non-fatal diagnostics of the read that produced `snapshot`.
    pub diagnostics: Diagnostics,
}

impl StateFile {
    pub fn new(snapshot: Snapshot, diagnostics: Diagnostics) -> Self {
        Self {
            written_at: Utc::now(),
            snapshot,
            diagnostics,
        }
    }

    /// Check the snapshot against the schema, then swap it into `path`.
    pub fn write(&self, path: &Path) -> Result<(), StateError> {
        conforms(&challenges_schema(), &serde_json::to_value(&self.snapshot)?)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|source| StateError::Persist {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, StateError> {
        let bytes = std::fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
