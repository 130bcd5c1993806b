#![warn(missing_docs)]
//! # site-triage-app
//!
//! ## Purpose
//! Orchestrates upload validation, the vision call, classification and
//! persistence for `site-triage`.
//!
//! ## Responsibilities
//! - Gate uploads by name, mime type and size.
//! - Shrink images before they reach the model.
//! - Normalize and classify model output, falling back to a fixed reading
//!   when the model is unavailable.
//! - Persist the original image and a history entry per request.
//! - Resolve configuration from the environment and install logging.
//!
//! ## Data flow
//! Upload -> [`validate_upload`] -> [`prepare_for_model`] -> vision client ->
//! `classify` -> history store -> [`AnalysisResponse`].
//!
//! ## Ownership and lifetimes
//! [`Analyzer`] owns its vision client and store; each request produces an
//! owned [`AnalysisResponse`].
//!
//! ## Error model
//! Rejected uploads and setup failures surface as [`AppError`]. Preprocessing,
//! model and persistence failures degrade with a warning instead.
//!
//! ## Security and privacy notes
//! Image bytes and API keys never appear in log events.

mod config;
mod logging;
mod upload;

pub use config::{AppConfig, ConfigError, DEFAULT_STORAGE_DIR, DEFAULT_THUMBNAIL_MAX_EDGE, keys};
pub use logging::{LoggingConfig, env_filter, init_logging};
pub use upload::{
    ALLOWED_CONTENT_TYPES, THUMBNAIL_JPEG_QUALITY, UploadError, content_type_for_path,
    prepare_for_model, preprocess_image, validate_upload,
};

use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use site_triage_classify::classify;
use site_triage_core::{AnalysisRecord, ClassificationResult};
use site_triage_history::{HistoryEntry, HistoryError, HistoryStore};
use site_triage_normalize::normalize_response;
use site_triage_vision::{
    HttpTransport, OfflineTransport, RecordSource, VisionClient, VisionConfig, VisionError,
    VisionTransport,
};
use thiserror::Error;
use tracing::{info, info_span, warn};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("SITE_TRIAGE_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Generates a random 128-bit request id as lowercase hex.
pub fn new_request_id() -> String {
    let mut bytes = [0_u8; 16];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Result of one analyze request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    /// Request identifier.
    pub request_id: String,
    /// Whether the record came from the model or the fallback.
    pub source: RecordSource,
    /// Normalized model reading.
    pub analysis: AnalysisRecord,
    /// Triage outcome.
    pub classification: ClassificationResult,
    /// Entry appended to the history.
    pub history_entry: HistoryEntry,
}

/// Normalizes and classifies an already-parsed model response.
pub fn classify_raw(
    raw: &serde_json::Value,
    image_id: &str,
) -> (AnalysisRecord, ClassificationResult) {
    let record = normalize_response(raw, image_id);
    let classification = classify(&record);
    (record, classification)
}

/// Transport chosen for a vision configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Live HTTPS calls to the vision service.
    Http,
    /// No API key: every call takes the fallback path.
    Offline,
}

/// Returns [`TransportKind::Http`] when an API key is configured.
pub fn transport_kind(config: &VisionConfig) -> TransportKind {
    if config.api_key().is_some() {
        TransportKind::Http
    } else {
        TransportKind::Offline
    }
}

/// Builds the transport selected by [`transport_kind`].
///
/// # Errors
/// Returns [`AppError::Vision`] when the HTTP client cannot be built.
pub fn transport_for(config: &VisionConfig) -> Result<Arc<dyn VisionTransport>, AppError> {
    let kind = transport_kind(config);
    info!(transport = ?kind, model = %config.model, "vision transport selected");
    let transport: Arc<dyn VisionTransport> = match kind {
        TransportKind::Http => Arc::new(HttpTransport::new()?),
        TransportKind::Offline => Arc::new(OfflineTransport),
    };
    Ok(transport)
}

/// Request orchestrator.
pub struct Analyzer {
    vision: VisionClient,
    store: HistoryStore,
    thumbnail_max_edge: u32,
}

impl Analyzer {
    /// Assembles an analyzer from parts.
    pub fn new(vision: VisionClient, store: HistoryStore, thumbnail_max_edge: u32) -> Self {
        Self {
            vision,
            store,
            thumbnail_max_edge,
        }
    }

    /// Builds an analyzer from configuration with an explicit transport.
    ///
    /// # Errors
    /// Returns [`AppError::Vision`] for an invalid endpoint and
    /// [`AppError::History`] when the storage root cannot be prepared.
    pub fn from_config(
        config: &AppConfig,
        transport: Arc<dyn VisionTransport>,
    ) -> Result<Self, AppError> {
        let vision = VisionClient::new(config.vision.clone(), transport)?;
        let store = HistoryStore::open(&config.storage_dir, config.history_limit)?;
        Ok(Self::new(vision, store, config.thumbnail_max_edge))
    }

    /// Builds an analyzer with the transport picked by [`transport_for`].
    ///
    /// # Errors
    /// Same as [`Analyzer::from_config`], plus HTTP client setup failures.
    pub fn from_env_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::from_config(config, transport_for(&config.vision)?)
    }

    /// Returns the history store.
    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Analyses one uploaded image.
    ///
    /// # Errors
    /// Returns [`AppError::Upload`] for rejected uploads and
    /// [`AppError::History`] when the history entry cannot be built.
    /// Image and history write failures are logged, not returned.
    pub fn analyze(
        &self,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<AnalysisResponse, AppError> {
        let request_id = new_request_id();
        let span = info_span!("analyze", request_id = %request_id);
        let _entered = span.enter();
        info!(filename, content_type, size = bytes.len(), "analyze request received");

        if let Err(error) = validate_upload(filename, content_type, bytes) {
            warn!(%error, "analyze request rejected");
            return Err(AppError::Upload(error));
        }

        let model_bytes = prepare_for_model(bytes, self.thumbnail_max_edge);
        let outcome = self.vision.analyze_with_fallback(&model_bytes, filename);
        let classification = classify(&outcome.record);

        if outcome.record.recommended_label != classification.label.as_str() {
            info!(
                recommended = %outcome.record.recommended_label,
                classified = %classification.label,
                "model recommendation differs from classifier"
            );
        }

        let history_entry = HistoryEntry::new(
            request_id.clone(),
            filename,
            classification.clone(),
            outcome.record.clone(),
        )?;

        if let Err(error) = self.store.save_image(&history_entry.image_filename, bytes) {
            warn!(%error, "failed to persist image");
        }
        if let Err(error) = self.store.append(history_entry.clone()) {
            warn!(%error, "failed to persist history entry");
        }

        info!(
            label = %classification.label,
            risk_score = classification.risk_score,
            source = ?outcome.source,
            "analysis complete"
        );

        Ok(AnalysisResponse {
            request_id,
            source: outcome.source,
            analysis: outcome.record,
            classification,
            history_entry,
        })
    }

    /// Returns up to `limit` history entries, newest first.
    ///
    /// # Errors
    /// Returns [`AppError::History`] when the history file cannot be read.
    pub fn history(&self, limit: usize) -> Result<Vec<HistoryEntry>, AppError> {
        let mut entries = self.store.load()?;
        entries.truncate(limit);
        Ok(entries)
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Upload rejected.
    #[error("upload rejected: {0}")]
    Upload(#[from] UploadError),
    /// Vision client setup error.
    #[error("vision error: {0}")]
    Vision(#[from] VisionError),
    /// History store error.
    #[error("history error: {0}")]
    History(#[from] HistoryError),
    /// Local file access error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON encode/decode error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
