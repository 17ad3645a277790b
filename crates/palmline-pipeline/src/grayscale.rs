//! Image decoding and grayscale conversion.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, GIF, WebP) and produces the
//! RGB colour buffer the pipeline works on, plus the single-channel
//! luminance image the preprocessor starts from.

use image::{GrayImage, Luma, RgbImage};

use crate::types::AnalysisError;

/// Decode raw image bytes into an RGB buffer.
///
/// Any colour model the `image` crate can decode is accepted; alpha is
/// dropped and palette / grayscale sources are expanded to RGB.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] if `bytes` is empty.
/// Returns [`AnalysisError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
/// Returns [`AnalysisError::EmptyImage`] if the decoded image has no
/// pixels.
pub fn decode_rgb(bytes: &[u8]) -> Result<RgbImage, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?.to_rgb8();
    ensure_non_empty(&img)?;
    Ok(img)
}

/// Reject zero-area buffers before they reach any stage.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyImage`] if either dimension is zero.
pub fn ensure_non_empty(image: &RgbImage) -> Result<(), AnalysisError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(AnalysisError::EmptyImage { width, height });
    }
    Ok(())
}

/// Convert RGB to luminance with the BT.601 weights
/// `0.299*R + 0.587*G + 0.114*B`, rounded.
#[must_use = "returns the grayscale image"]
pub fn to_grayscale(image: &RgbImage) -> GrayImage {
    imageproc::map::map_pixels(image, |p| {
        let [r, g, b] = p.0;
        let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
        #[allow(clippy::cast_possible_truncation)]
        let luma = ((weighted + 500) / 1000) as u8;
        Luma([luma])
    })
}
