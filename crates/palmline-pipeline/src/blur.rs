//! Gaussian smoothing ahead of the gradient-based stages.
//!
//! Uses the fixed 5-tap binomial kernel `[1, 4, 6, 4, 1] / 16`, which is
//! the discrete Gaussian a 5×5 window gets when no sigma is specified.
//! Applied separably through [`imageproc::filter::separable_filter_equal`].

use image::GrayImage;

/// Normalized 5-tap binomial kernel.
pub const BINOMIAL_5: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];

/// Smooth a grayscale image with a 5×5 Gaussian window.
///
/// Borders are handled by edge clamping.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur_5x5(image: &GrayImage) -> GrayImage {
    imageproc::filter::separable_filter_equal(image, &BINOMIAL_5)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sharp black-to-white boundary at x=5.
    fn sharp_edge_image() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _y| {
            if x < 5 {
                image::Luma([0])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn kernel_sums_to_one() {
        let sum: f32 = BINOMIAL_5.iter().sum();
        assert!((sum - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = GrayImage::new(17, 31);
        let blurred = gaussian_blur_5x5(&img);
        assert_eq!(blurred.dimensions(), (17, 31));
    }

    #[test]
    fn blur_smooths_sharp_edge() {
        let blurred = gaussian_blur_5x5(&sharp_edge_image());
        let left_of_edge = blurred.get_pixel(4, 5).0[0];
        let right_of_edge = blurred.get_pixel(5, 5).0[0];

        assert!(
            left_of_edge > 0,
            "expected blur to raise left-of-edge above 0, got {left_of_edge}",
        );
        assert!(
            right_of_edge < 255,
            "expected blur to lower right-of-edge below 255, got {right_of_edge}",
        );
    }

    #[test]
    fn blur_leaves_far_pixels_alone() {
        // The kernel reaches two pixels; x=0 and x=9 are three away.
        let blurred = gaussian_blur_5x5(&sharp_edge_image());
        assert_eq!(blurred.get_pixel(0, 5).0[0], 0);
        assert_eq!(blurred.get_pixel(9, 5).0[0], 255);
    }

    #[test]
    fn uniform_image_unchanged_by_blur() {
        let img = GrayImage::from_pixel(10, 10, image::Luma([128]));
        let blurred = gaussian_blur_5x5(&img);
        for pixel in blurred.pixels() {
            let diff = i16::from(pixel.0[0]) - 128;
            assert!(
                diff.abs() <= 1,
                "expected uniform image to stay near 128 after blur, got {}",
                pixel.0[0],
            );
        }
    }
}
