//! Preprocessor: luminance, contrast normalization, and denoise.

use image::{GrayImage, RgbImage};

use crate::types::AnalysisConfig;
use crate::{blur, contrast, grayscale};

/// Every intermediate raster of the preprocessing stage.
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// BT.601 luminance of the input.
    pub gray: GrayImage,
    /// Global histogram equalization of `gray`. Computed for inspection
    /// only; later stages read `smoothed`.
    pub equalized: GrayImage,
    /// CLAHE of `gray`.
    pub clahe: GrayImage,
    /// 5×5 Gaussian of `clahe`; the stage output.
    pub smoothed: GrayImage,
}

/// Run the preprocessing steps in order and keep every intermediate.
#[must_use]
pub fn preprocess_stages(image: &RgbImage, config: &AnalysisConfig) -> Preprocessed {
    let gray = grayscale::to_grayscale(image);
    let equalized = contrast::equalize_global(&gray);
    let clahe = contrast::clahe(&gray, config.clahe_clip_limit, config.clahe_tile_grid);
    let smoothed = blur::gaussian_blur_5x5(&clahe);
    Preprocessed {
        gray,
        equalized,
        clahe,
        smoothed,
    }
}

/// Colour buffer in, smoothed single-channel buffer of the same
/// dimensions out.
#[must_use = "returns the preprocessed image"]
pub fn preprocess(image: &RgbImage, config: &AnalysisConfig) -> GrayImage {
    preprocess_stages(image, config).smoothed
}
