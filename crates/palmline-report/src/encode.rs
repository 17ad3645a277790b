//! Annotated image encoding: compressed bytes and base64 text.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use serde::{Deserialize, Serialize};

use crate::ReportError;

/// JPEG quality used for annotated images.
pub const JPEG_QUALITY: u8 = 95;

/// Output format of the annotated image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Baseline JPEG at [`JPEG_QUALITY`].
    #[default]
    Jpeg,
    /// Lossless PNG.
    Png,
}

impl OutputFormat {
    /// Conventional file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }
}

/// Compress `image` in `format`.
///
/// # Errors
///
/// Returns [`ReportError::Encode`] if the encoder fails.
pub fn encode_image(image: &RgbImage, format: OutputFormat) -> Result<Vec<u8>, ReportError> {
    let mut buf = Vec::new();
    let (width, height) = image.dimensions();
    match format {
        OutputFormat::Jpeg => JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgb8,
        )?,
        OutputFormat::Png => PngEncoder::new(&mut buf).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgb8,
        )?,
    }
    Ok(buf)
}

/// Standard base64 (with padding) of `bytes`.
#[must_use]
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// [`encode_image`] followed by [`to_base64`].
///
/// # Errors
///
/// Returns [`ReportError::Encode`] if the encoder fails.
pub fn encode_base64(image: &RgbImage, format: OutputFormat) -> Result<String, ReportError> {
    encode_image(image, format).map(|bytes| to_base64(&bytes))
}
