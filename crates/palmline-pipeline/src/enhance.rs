//! Feature enhancer: emphasize thin dark creases.
//!
//! Four signals are computed over the whole preprocessed image:
//!
//! - 3×3 Sobel gradient magnitude
//! - gradient direction `atan2(gy, gx)`, kept for callers but not used
//!   by the line extractor
//! - absolute 4-neighbour Laplacian (ridge response)
//! - white top-hat with the 3×3 cross (bright detail narrower than the
//!   element)
//!
//! They are combined as `max(max(|lap| * 0.5, top_hat), magnitude * 0.3)`
//! and, when a hand mask is available, everything outside it is zeroed.

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel::{self, Kernel};
use imageproc::morphology::Mask;

use crate::types::DirectionMap;

/// 4-neighbour Laplacian.
const LAPLACIAN_4: [i32; 9] = [0, 1, 0, 1, -4, 1, 0, 1, 0];

/// Weight of the absolute Laplacian in the combined response.
pub const LAPLACIAN_WEIGHT: f32 = 0.5;

/// Weight of the gradient magnitude in the combined response.
pub const MAGNITUDE_WEIGHT: f32 = 0.3;

/// Output of the enhancer.
#[derive(Debug, Clone)]
pub struct Enhanced {
    /// Combined 8-bit ridge response.
    pub ridges: GrayImage,
    /// Gradient direction in radians.
    pub direction: DirectionMap,
}

/// Sobel magnitude and direction of `image`.
#[must_use]
pub fn gradients(image: &GrayImage) -> (Image<Luma<f32>>, DirectionMap) {
    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    let (width, height) = image.dimensions();

    let magnitude = Image::from_fn(width, height, |x, y| {
        let h = f32::from(gx.get_pixel(x, y).0[0]);
        let v = f32::from(gy.get_pixel(x, y).0[0]);
        Luma([h.hypot(v)])
    });
    let direction = DirectionMap::from_fn(width, height, |x, y| {
        let h = f32::from(gx.get_pixel(x, y).0[0]);
        let v = f32::from(gy.get_pixel(x, y).0[0]);
        Luma([v.atan2(h)])
    });
    (magnitude, direction)
}

/// Absolute 4-neighbour Laplacian.
#[must_use]
pub fn abs_laplacian(image: &GrayImage) -> Image<Luma<u16>> {
    let lap: Image<Luma<i16>> = filter_clamped(image, Kernel::new(&LAPLACIAN_4, 3, 3));
    Image::from_fn(image.width(), image.height(), |x, y| {
        Luma([lap.get_pixel(x, y).0[0].unsigned_abs()])
    })
}

/// White top-hat: `image - open(image)` with the 3×3 cross.
#[must_use]
pub fn top_hat(image: &GrayImage) -> GrayImage {
    let opened = imageproc::morphology::grayscale_open(image, &Mask::diamond(1));
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([image
            .get_pixel(x, y)
            .0[0]
            .saturating_sub(opened.get_pixel(x, y).0[0])])
    })
}

/// Run the enhancer on a preprocessed image.
///
/// `hand_mask`, when given, must match the image dimensions; pixels where
/// it is zero are forced to zero. Without a mask the whole frame is kept.
#[must_use]
pub fn enhance(image: &GrayImage, hand_mask: Option<&GrayImage>) -> Enhanced {
    let (magnitude, direction) = gradients(image);
    let laplacian = abs_laplacian(image);
    let hat = top_hat(image);

    let mut ridges = GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let lap = f32::from(laplacian.get_pixel(x, y).0[0]) * LAPLACIAN_WEIGHT;
        let hat = f32::from(hat.get_pixel(x, y).0[0]);
        let mag = magnitude.get_pixel(x, y).0[0] * MAGNITUDE_WEIGHT;
        Luma([to_u8(lap.max(hat).max(mag))])
    });

    if let Some(mask) = hand_mask {
        apply_mask(&mut ridges, mask);
    }

    Enhanced { ridges, direction }
}

/// Zero every pixel of `image` where `mask` is zero or out of range.
pub fn apply_mask(image: &mut GrayImage, mask: &GrayImage) {
    let (mw, mh) = mask.dimensions();
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if x >= mw || y >= mh || mask.get_pixel(x, y).0[0] == 0 {
            *pixel = Luma([0]);
        }
    }
}

/// Drop the fraction and saturate at 255.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(value: f32) -> u8 {
    value.clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mid-grey background with a one-pixel bright vertical ridge at x=10.
    fn ridge_image() -> GrayImage {
        GrayImage::from_fn(21, 21, |x, _| if x == 10 { Luma([200]) } else { Luma([100]) })
    }

    #[test]
    fn uniform_image_has_no_response() {
        let img = GrayImage::from_pixel(16, 16, Luma([90]));
        let out = enhance(&img, None);
        assert!(out.ridges.pixels().all(|p| p.0[0] == 0));
        assert_eq!(out.direction.dimensions(), (16, 16));
    }

    #[test]
    fn top_hat_keeps_thin_bright_detail() {
        let hat = top_hat(&ridge_image());
        assert_eq!(hat.get_pixel(10, 10).0[0], 100);
        assert_eq!(hat.get_pixel(5, 10).0[0], 0);
    }

    #[test]
    fn laplacian_magnitude_of_ridge() {
        let lap = abs_laplacian(&ridge_image());
        // Centre: 100 + 100 + 200 + 200 - 4*200 = -200.
        assert_eq!(lap.get_pixel(10, 10).0[0], 200);
        // Beside: 200 + 100 + 100 + 100 - 4*100 = 100.
        assert_eq!(lap.get_pixel(9, 10).0[0], 100);
        assert_eq!(lap.get_pixel(3, 10).0[0], 0);
    }

    #[test]
    fn combined_response_saturates() {
        // Sobel L2 across a 0/255 step is 1020; 0.3 of that exceeds 255.
        let img = GrayImage::from_fn(10, 10, |x, _| if x < 5 { Luma([0]) } else { Luma([255]) });
        let out = enhance(&img, None);
        assert_eq!(out.ridges.get_pixel(4, 5).0[0], 255);
    }

    #[test]
    fn direction_points_along_gradient() {
        let img = GrayImage::from_fn(10, 10, |x, _| if x < 5 { Luma([0]) } else { Luma([255]) });
        let out = enhance(&img, None);
        assert!(out.direction.get_pixel(4, 5).0[0].abs() < 1e-6);
        let img = GrayImage::from_fn(10, 10, |_, y| if y < 5 { Luma([0]) } else { Luma([255]) });
        let out = enhance(&img, None);
        let angle = out.direction.get_pixel(5, 4).0[0];
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn mask_zeroes_outside_hand() {
        let img = ridge_image();
        let mut mask = GrayImage::new(21, 21);
        for y in 0..10 {
            for x in 0..21 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let masked = enhance(&img, Some(&mask));
        let unmasked = enhance(&img, None);
        assert_eq!(masked.ridges.get_pixel(10, 5), unmasked.ridges.get_pixel(10, 5));
        assert!(masked.ridges.get_pixel(10, 5).0[0] > 0);
        assert_eq!(masked.ridges.get_pixel(10, 15).0[0], 0);
        assert!(unmasked.ridges.get_pixel(10, 15).0[0] > 0);
    }

    #[test]
    fn no_mask_means_no_masking() {
        let img = ridge_image();
        let full = GrayImage::from_pixel(21, 21, Luma([255]));
        assert_eq!(enhance(&img, None).ridges, enhance(&img, Some(&full)).ridges);
    }
}
