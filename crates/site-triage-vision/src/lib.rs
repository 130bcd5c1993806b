#![warn(missing_docs)]
//! # site-triage-vision
//!
//! ## Purpose
//! Wraps the external vision model that describes a catheter-site photo.
//!
//! ## Responsibilities
//! - Build the prompt/request envelope sent to the model.
//! - Execute requests through an injectable [`VisionTransport`]:
//!   [`HttpTransport`] for the live service, [`OfflineTransport`] when no
//!   API key is configured.
//! - Validate endpoint policy (parseable HTTPS URL).
//! - Decode and normalize model output, or substitute a deterministic
//!   fallback record when the call fails.
//!
//! ## Data flow
//! Image bytes -> [`VisionClient::analyze`] -> [`VisionTransport::generate`]
//! -> JSON text -> `normalize_response` -> [`AnalysisRecord`].
//!
//! ## Ownership and lifetimes
//! Requests own a base64 copy of the image so transports can retry without
//! borrowing caller buffers.
//!
//! ## Error model
//! [`VisionClient::analyze`] reports [`VisionError`].
//! [`VisionClient::analyze_with_fallback`] never fails; it logs the error and
//! returns [`mock_record`] tagged as [`RecordSource::Fallback`].
//!
//! ## Security and privacy notes
//! The API key is never logged and is redacted from `Debug` output.

mod http;

pub use http::{
    API_KEY_HEADER, HttpTransport, REQUEST_TIMEOUT, candidate_text, generate_content_body,
    generate_content_url,
};

use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::json;
use site_triage_core::AnalysisRecord;
use site_triage_normalize::normalize_response;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Model used when none is configured.
pub const DEFAULT_VISION_MODEL: &str = "models/gemini-2.5-pro";

/// Endpoint used when none is configured.
pub const DEFAULT_VISION_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Instruction sent alongside every image.
pub const VISION_PROMPT: &str = "You are a clinical assistant triaging catheter site photos. \
Extract the requested structured JSON schema exactly as specified. \
Respond only with valid JSON matching the schema that contains: image_id, quality, \
localization, features (redness, swelling, dressing_lift, discharge, exposed_catheter, \
open_wound, bruising, crusting, erythema_border_sharp, fluctuance), overall_confidence, \
recommended_label, explanation.";

/// Mime type of images sent to the model. Uploads are re-encoded as JPEG.
pub const REQUEST_MIME_TYPE: &str = "image/jpeg";

/// Vision client settings.
#[derive(Clone, PartialEq, Eq)]
pub struct VisionConfig {
    /// Base URL of the vision service.
    pub endpoint: String,
    /// Model identifier.
    pub model: String,
    /// API key; `None` disables model calls.
    pub api_key: Option<String>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
            model: DEFAULT_VISION_MODEL.to_string(),
            api_key: None,
        }
    }
}

impl VisionConfig {
    /// Returns the API key when one is configured and not blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

impl fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Request envelope handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionRequest {
    /// Model identifier.
    pub model: String,
    /// Instruction text.
    pub prompt: String,
    /// Mime type of `image_base64`.
    pub mime_type: String,
    /// Standard base64 image bytes.
    pub image_base64: String,
}

impl VisionRequest {
    /// Builds a request for one image.
    pub fn new(model: impl Into<String>, image_bytes: &[u8]) -> Self {
        Self {
            model: model.into(),
            prompt: VISION_PROMPT.to_string(),
            mime_type: REQUEST_MIME_TYPE.to_string(),
            image_base64: base64::engine::general_purpose::STANDARD.encode(image_bytes),
        }
    }
}

/// Abstract transport to the vision service.
pub trait VisionTransport: Send + Sync {
    /// Sends one request and returns the first candidate's text.
    fn generate(
        &self,
        endpoint: &str,
        api_key: &str,
        request: &VisionRequest,
    ) -> Result<String, VisionError>;
}

/// Transport used when no API key is configured; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineTransport;

impl VisionTransport for OfflineTransport {
    fn generate(
        &self,
        _endpoint: &str,
        _api_key: &str,
        _request: &VisionRequest,
    ) -> Result<String, VisionError> {
        Err(VisionError::Transport(
            "no network transport configured".to_string(),
        ))
    }
}

/// Where an analysis record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// Normalized model output.
    Model,
    /// Deterministic fallback after a failed model call.
    Fallback,
}

/// Record plus provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionOutcome {
    /// Normalized record.
    pub record: AnalysisRecord,
    /// Provenance of `record`.
    pub source: RecordSource,
}

/// Vision client that validates endpoint policy and normalizes output.
#[derive(Clone)]
pub struct VisionClient {
    config: VisionConfig,
    transport: Arc<dyn VisionTransport>,
}

impl VisionClient {
    /// Creates a validated client.
    ///
    /// # Errors
    /// Returns [`VisionError::InvalidEndpoint`] when the endpoint is not an
    /// HTTPS URL.
    pub fn new(
        config: VisionConfig,
        transport: Arc<dyn VisionTransport>,
    ) -> Result<Self, VisionError> {
        validate_vision_endpoint(&config.endpoint)?;
        Ok(Self { config, transport })
    }

    /// Sends one image to the model and normalizes the answer.
    ///
    /// # Errors
    /// Returns [`VisionError::MissingApiKey`] when no key is configured,
    /// [`VisionError::EmptyResponse`] for blank output, [`VisionError::Decode`]
    /// for non-JSON output, and propagates transport errors.
    pub fn analyze(
        &self,
        image_bytes: &[u8],
        image_name: &str,
    ) -> Result<AnalysisRecord, VisionError> {
        let api_key = self.config.api_key().ok_or(VisionError::MissingApiKey)?;

        let request = VisionRequest::new(self.config.model.clone(), image_bytes);
        let text = self
            .transport
            .generate(&self.config.endpoint, api_key, &request)?;
        if text.trim().is_empty() {
            return Err(VisionError::EmptyResponse);
        }

        let raw: serde_json::Value = serde_json::from_str(&text)?;
        debug!(image_name, model = %self.config.model, "model output decoded");
        Ok(normalize_response(&raw, image_name))
    }

    /// Same as [`VisionClient::analyze`], substituting [`mock_record`] on any
    /// failure.
    pub fn analyze_with_fallback(&self, image_bytes: &[u8], image_name: &str) -> VisionOutcome {
        match self.analyze(image_bytes, image_name) {
            Ok(record) => VisionOutcome {
                record,
                source: RecordSource::Model,
            },
            Err(error) => {
                let detail = redact_sensitive(&error.to_string());
                warn!(image_name, error = %detail, "vision call failed; using fallback record");
                VisionOutcome {
                    record: mock_record(image_name),
                    source: RecordSource::Fallback,
                }
            }
        }
    }

    /// Returns the configured model identifier.
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

/// Deterministic stand-in record used when the model is unavailable.
pub fn mock_record(image_name: &str) -> AnalysisRecord {
    let raw = json!({
        "quality": {
            "adequate_lighting": true,
            "focused": true,
            "view_complete": true,
            "notes": ""
        },
        "localization": {
            "bbox": [50, 50, 450, 450],
            "segmentation_mask_available": false
        },
        "features": {
            "redness": {"present": true, "extent_percent": 30.0, "confidence": 0.9},
            "swelling": {"present": true, "extent_percent": 15.0, "confidence": 0.85},
            "dressing_lift": {"present": false, "confidence": 0.9},
            "discharge": {"present": false, "type": null, "amount": "none", "confidence": 0.95},
            "exposed_catheter": {"present": false, "length_mm_estimate": null, "confidence": 0.98},
            "open_wound": {"present": false, "size_mm": null, "confidence": 0.98},
            "bruising": {"present": false, "confidence": 0.8},
            "crusting": {"present": false, "confidence": 0.8},
            "erythema_border_sharp": {"yes": false, "confidence": 0.9},
            "fluctuance": {"present": false, "confidence": 0.6}
        },
        "overall_confidence": 0.88,
        "recommended_label": "Yellow",
        "explanation": "Redness and mild swelling detected; caution advised."
    });
    normalize_response(&raw, image_name)
}

/// Redacts credential markers (API keys, tokens, authorization headers) from
/// text that is about to be logged.
///
/// Everything from the first marker onwards is replaced.
pub fn redact_sensitive(input: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let first = ["key=", "api_key", "x-goog-api-key", "token", "authorization", "bearer"]
        .iter()
        .filter_map(|marker| lower.find(marker).map(|position| (position, *marker)))
        .min_by_key(|(position, _)| *position);

    match first {
        Some((position, marker)) => format!("{}{marker}<redacted>", &input[..position]),
        None => input.to_string(),
    }
}

/// Validates vision endpoint constraints.
///
/// # Errors
/// Returns [`VisionError::InvalidEndpoint`] for unparsable or non-HTTPS URLs.
pub fn validate_vision_endpoint(endpoint: &str) -> Result<(), VisionError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| VisionError::InvalidEndpoint(format!("invalid vision url: {error}")))?;

    if parsed.scheme() != "https" {
        return Err(VisionError::InvalidEndpoint(
            "vision endpoint must use https".to_string(),
        ));
    }

    Ok(())
}

/// Errors produced by the vision client.
#[derive(Debug, Error)]
pub enum VisionError {
    /// Endpoint violates security requirements.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// No API key configured.
    #[error("vision api key is not configured")]
    MissingApiKey,
    /// Transport failure from the vision backend.
    #[error("vision transport failure: {0}")]
    Transport(String),
    /// Backend answered without candidate text.
    #[error("vision response contained no text")]
    EmptyResponse,
    /// Candidate text was not JSON.
    #[error("vision response is not valid json: {0}")]
    Decode(#[from] serde_json::Error),
}
