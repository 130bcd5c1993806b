//! Shared fixtures for app integration tests.

use std::io::Cursor;
use std::sync::Arc;

use site_triage_app::Analyzer;
use site_triage_history::HistoryStore;
use site_triage_vision::{VisionClient, VisionConfig, VisionError, VisionRequest, VisionTransport};

/// Transport that answers every request with fixed text.
#[allow(dead_code)]
pub struct CannedTransport(pub String);

impl VisionTransport for CannedTransport {
    fn generate(
        &self,
        _endpoint: &str,
        _api_key: &str,
        _request: &VisionRequest,
    ) -> Result<String, VisionError> {
        Ok(self.0.clone())
    }
}

/// Encodes a solid-colour PNG of the given size.
#[allow(dead_code)]
pub fn fixture_png(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb([200, 120, 110]));
    let mut bytes = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("png fixture should encode");
    bytes.into_inner()
}

/// Builds an analyzer over `root` whose model always answers `model_output`.
#[allow(dead_code)]
pub fn fixture_analyzer(root: &std::path::Path, model_output: &str) -> Analyzer {
    let vision = VisionClient::new(
        VisionConfig {
            api_key: Some("test-key".to_string()),
            ..VisionConfig::default()
        },
        Arc::new(CannedTransport(model_output.to_string())),
    )
    .expect("vision client should build");
    let store = HistoryStore::open(root, 5).expect("store should open");
    Analyzer::new(vision, store, 256)
}
