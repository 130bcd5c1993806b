#![warn(missing_docs)]
//! # site-triage-history
//!
//! ## Purpose
//! Persists analysed images and a bounded, newest-first analysis history.
//!
//! ## Responsibilities
//! - Store original image bytes under `<root>/images/`.
//! - Maintain `<root>/history.json` capped at a configured entry count.
//! - Recover from a corrupt history file by starting over.
//!
//! ## Data flow
//! App builds a [`HistoryEntry`] after classification -> [`HistoryStore::append`]
//! rewrites the history file -> [`HistoryStore::load`] serves listings.
//!
//! ## Ownership and lifetimes
//! Entries own their records; the store owns only its root path.
//!
//! ## Error model
//! Filesystem and codec failures surface as [`HistoryError`]. A history file
//! that fails to parse is logged and treated as empty.
//!
//! ## Security and privacy notes
//! Image file names are validated so callers cannot escape the image
//! directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use site_triage_core::{AnalysisRecord, ClassificationResult};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

/// Entries kept when no limit is configured.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// History file name under the storage root.
pub const HISTORY_FILE_NAME: &str = "history.json";

/// Image directory name under the storage root.
pub const IMAGE_DIR_NAME: &str = "images";

/// URL prefix under which stored images are served.
pub const IMAGE_URL_PREFIX: &str = "/history/image/";

/// One persisted analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Request identifier.
    pub id: String,
    /// RFC 3339 UTC timestamp.
    pub timestamp: String,
    /// URL path of the stored image.
    pub image_url: String,
    /// Stored image file name.
    pub image_filename: String,
    /// File name supplied by the uploader.
    pub original_filename: String,
    /// Triage outcome.
    pub classification: ClassificationResult,
    /// Normalized model reading.
    pub analysis: AnalysisRecord,
}

impl HistoryEntry {
    /// Builds an entry stamped with the current UTC time.
    ///
    /// # Errors
    /// Returns [`HistoryError::Timestamp`] when time formatting fails.
    pub fn new(
        id: impl Into<String>,
        original_filename: impl Into<String>,
        classification: ClassificationResult,
        analysis: AnalysisRecord,
    ) -> Result<Self, HistoryError> {
        Self::at(
            id,
            original_filename,
            classification,
            analysis,
            OffsetDateTime::now_utc(),
        )
    }

    /// Builds an entry stamped with `at`.
    ///
    /// # Errors
    /// Returns [`HistoryError::Timestamp`] when time formatting fails.
    pub fn at(
        id: impl Into<String>,
        original_filename: impl Into<String>,
        classification: ClassificationResult,
        analysis: AnalysisRecord,
        at: OffsetDateTime,
    ) -> Result<Self, HistoryError> {
        let id = id.into();
        let image_filename = format!("{id}.jpg");
        Ok(Self {
            timestamp: at.format(&Rfc3339)?,
            image_url: format!("{IMAGE_URL_PREFIX}{image_filename}"),
            image_filename,
            original_filename: original_filename.into(),
            classification,
            analysis,
            id,
        })
    }
}

/// File-backed history and image store.
#[derive(Debug)]
pub struct HistoryStore {
    root: PathBuf,
    limit: usize,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    /// Opens (and creates) a store rooted at `root`.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidLimit`] when `limit == 0` and
    /// [`HistoryError::Io`] when directories cannot be created.
    pub fn open(root: impl Into<PathBuf>, limit: usize) -> Result<Self, HistoryError> {
        if limit == 0 {
            return Err(HistoryError::InvalidLimit);
        }

        let root = root.into();
        std::fs::create_dir_all(root.join(IMAGE_DIR_NAME))?;
        Ok(Self {
            root,
            limit,
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the history file path.
    pub fn history_path(&self) -> PathBuf {
        self.root.join(HISTORY_FILE_NAME)
    }

    /// Loads all entries, newest first.
    ///
    /// # Errors
    /// Returns [`HistoryError::Io`] for read failures other than a missing file.
    pub fn load(&self) -> Result<Vec<HistoryEntry>, HistoryError> {
        let path = self.history_path();
        let raw = match std::fs::read(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(error) => return Err(HistoryError::Io(error)),
        };

        match serde_json::from_slice(&raw) {
            Ok(entries) => Ok(entries),
            Err(error) => {
                warn!(path = %path.display(), %error, "history file corrupt, resetting");
                Ok(Vec::new())
            }
        }
    }

    /// Prepends `entry` and truncates the history to the configured limit.
    ///
    /// # Errors
    /// Returns [`HistoryError::Io`] or [`HistoryError::Codec`] when the file
    /// cannot be rewritten.
    pub fn append(&self, entry: HistoryEntry) -> Result<(), HistoryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut entries = self.load()?;
        entries.insert(0, entry);
        entries.truncate(self.limit);

        let encoded = serde_json::to_vec_pretty(&entries)?;
        std::fs::write(self.history_path(), encoded)?;
        Ok(())
    }

    /// Writes image bytes under the image directory.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidFilename`] for names that are empty or
    /// contain path components, and [`HistoryError::Io`] on write failure.
    pub fn save_image(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, HistoryError> {
        let path = self.image_path(filename)?;
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Resolves a stored image name to its path.
    ///
    /// # Errors
    /// Returns [`HistoryError::InvalidFilename`] for unsafe names.
    pub fn image_path(&self, filename: &str) -> Result<PathBuf, HistoryError> {
        validate_image_filename(filename)?;
        Ok(self.root.join(IMAGE_DIR_NAME).join(filename))
    }
}

fn validate_image_filename(filename: &str) -> Result<(), HistoryError> {
    let unsafe_name = filename.trim().is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains(['/', '\\'])
        || filename.contains('\0');
    if unsafe_name {
        return Err(HistoryError::InvalidFilename(filename.to_string()));
    }
    Ok(())
}

/// Errors produced by the history store.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Filesystem failure.
    #[error("history io failure: {0}")]
    Io(#[from] std::io::Error),
    /// History encoding failure.
    #[error("history codec failure: {0}")]
    Codec(#[from] serde_json::Error),
    /// Timestamp formatting failure.
    #[error("history timestamp failure: {0}")]
    Timestamp(#[from] time::error::Format),
    /// Image name would escape the image directory.
    #[error("invalid image filename: {0:?}")]
    InvalidFilename(String),
    /// History limit must be strictly positive.
    #[error("history limit must be greater than zero")]
    InvalidLimit,
}
