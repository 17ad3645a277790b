//! Edge map for the line extractor.
//!
//! Canny on the enhanced ridge image, then a 3×3 cross closing that
//! bridges one-pixel breaks so the Hough stage sees continuous strokes.

use image::GrayImage;
use imageproc::distance_transform::Norm;

/// Minimum allowed Canny threshold.
///
/// A low threshold of zero turns every pixel with any gradient into a
/// candidate and floods the Hough accumulator.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Thresholds as Canny will use them: both at least [`MIN_THRESHOLD`],
/// and `low` at most `high`.
#[must_use]
pub fn clamp_thresholds(low_threshold: f32, high_threshold: f32) -> (f32, f32) {
    let high = high_threshold.max(MIN_THRESHOLD);
    let low = low_threshold.max(MIN_THRESHOLD).min(high);
    (low, high)
}

/// Canny edge detection with thresholds sanitized by [`clamp_thresholds`].
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let (low, high) = clamp_thresholds(low_threshold, high_threshold);
    crate::canny::canny(image, low, high)
}

/// Morphological closing with the 3×3 cross (the 3×3 ellipse).
#[must_use = "returns the closed edge map"]
pub fn close_edges(edges: &GrayImage) -> GrayImage {
    imageproc::morphology::close(edges, Norm::L1, 1)
}

/// Canny followed by closing: the binary map the segment detector reads.
#[must_use = "returns the binary edge map"]
pub fn detect_edges(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    close_edges(&canny(image, low_threshold, high_threshold))
}

/// Number of non-zero pixels.
#[must_use]
pub fn count_nonzero(image: &GrayImage) -> u64 {
    image.pixels().map(|p| u64::from(p.0[0] != 0)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 20x20 image with a sharp vertical boundary at x = 10.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(20, 20, |x, _y| {
            if x < 10 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn blank_image_produces_no_edges() {
        let img = GrayImage::from_pixel(20, 20, image::Luma([128]));
        let edges = detect_edges(&img, 30.0, 100.0);
        assert_eq!(edges.dimensions(), (20, 20));
        assert_eq!(count_nonzero(&edges), 0, "expected no edges in uniform image");
    }

    #[test]
    fn sharp_edge_detected() {
        let edges = detect_edges(&sharp_edge_image(), 30.0, 100.0);
        assert!(count_nonzero(&edges) > 0, "expected edges at sharp boundary");
    }

    #[test]
    fn closing_fills_pinhole() {
        let mut img = GrayImage::new(20, 20);
        for (x, y) in [(9, 9), (11, 9), (10, 8), (10, 10)] {
            img.put_pixel(x, y, image::Luma([255]));
        }
        let closed = close_edges(&img);
        assert_eq!(closed.get_pixel(10, 9).0[0], 255);
        assert_eq!(closed.get_pixel(12, 9).0[0], 0);
    }

    #[test]
    fn closing_never_removes_edges() {
        let mut img = GrayImage::new(15, 15);
        img.put_pixel(7, 7, image::Luma([255]));
        img.put_pixel(3, 11, image::Luma([255]));
        let closed = close_edges(&img);
        assert_eq!(closed.get_pixel(7, 7).0[0], 255);
        assert_eq!(closed.get_pixel(3, 11).0[0], 255);
    }

    #[test]
    fn zero_low_threshold_is_clamped_to_min() {
        let img = sharp_edge_image();
        assert_eq!(canny(&img, 0.0, 150.0), canny(&img, MIN_THRESHOLD, 150.0));
    }

    #[test]
    fn low_above_high_is_clamped() {
        let img = sharp_edge_image();
        assert_eq!(canny(&img, 200.0, 100.0), canny(&img, 100.0, 100.0));
    }

    #[test]
    fn clamped_thresholds() {
        assert_eq!(clamp_thresholds(30.0, 100.0), (30.0, 100.0));
        assert_eq!(clamp_thresholds(-5.0, 0.0), (MIN_THRESHOLD, MIN_THRESHOLD));
        assert_eq!(clamp_thresholds(120.0, 80.0), (80.0, 80.0));
    }
}
