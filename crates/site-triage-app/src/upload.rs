//! Upload validation and image preprocessing ahead of the model call.

use std::io::Cursor;
use std::path::Path;

use image::ImageReader;
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;
use tracing::warn;

/// Mime types accepted for analysis.
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

/// JPEG quality of the re-encoded thumbnail.
pub const THUMBNAIL_JPEG_QUALITY: u8 = 85;

/// Maps a file extension to an accepted mime type.
pub fn content_type_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Checks that an upload can be analysed.
///
/// # Errors
/// Returns [`UploadError::MissingFilename`] for a blank name,
/// [`UploadError::UnsupportedFormat`] for mime types outside
/// [`ALLOWED_CONTENT_TYPES`], and [`UploadError::EmptyPayload`] for zero bytes.
pub fn validate_upload(filename: &str, content_type: &str, bytes: &[u8]) -> Result<(), UploadError> {
    if filename.trim().is_empty() {
        return Err(UploadError::MissingFilename);
    }
    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(UploadError::UnsupportedFormat(content_type.to_string()));
    }
    if bytes.is_empty() {
        return Err(UploadError::EmptyPayload);
    }
    Ok(())
}

/// Decodes an image, shrinks it to fit `max_edge` (aspect preserved, never
/// enlarged) and re-encodes it as JPEG.
///
/// # Errors
/// Returns [`image::ImageError`] when decoding or encoding fails.
pub fn preprocess_image(bytes: &[u8], max_edge: u32) -> Result<Vec<u8>, image::ImageError> {
    let decoded = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    let resized = if decoded.width() > max_edge || decoded.height() > max_edge {
        decoded.thumbnail(max_edge, max_edge)
    } else {
        decoded
    };

    let rgb = resized.to_rgb8();
    let mut jpeg_bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg_bytes, THUMBNAIL_JPEG_QUALITY).encode(
        &rgb,
        rgb.width(),
        rgb.height(),
        image::ColorType::Rgb8.into(),
    )?;
    Ok(jpeg_bytes)
}

/// Same as [`preprocess_image`], returning the original bytes on failure.
pub fn prepare_for_model(bytes: &[u8], max_edge: u32) -> Vec<u8> {
    match preprocess_image(bytes, max_edge) {
        Ok(processed) => processed,
        Err(error) => {
            warn!(%error, "failed to preprocess image; sending original bytes");
            bytes.to_vec()
        }
    }
}

/// Upload rejection reasons.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    /// No file name supplied.
    #[error("filename missing")]
    MissingFilename,
    /// Mime type is not accepted.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
    /// File has no bytes.
    #[error("empty file payload")]
    EmptyPayload,
}
