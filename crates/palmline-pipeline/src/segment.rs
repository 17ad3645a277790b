//! Region segmenter: isolate the hand by skin colour.
//!
//! Steps:
//!
//! 1. RGB to 8-bit HSV (H in `0..180`, S and V in `0..=255`)
//! 2. Inclusive threshold against the configured skin bounds
//! 3. Binary opening then closing with a square element
//! 4. External contours; keep the one with the largest area
//! 5. Rasterize that contour, filled, into the hand mask

use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::point::Point;

use crate::contour;
use crate::types::{AnalysisConfig, HandContour, HandRegion};

/// Convert one RGB pixel to 8-bit HSV.
///
/// Hue is degrees halved so it fits a byte (`0..180`); saturation is
/// `255 * (max - min) / max`; value is `max`. All three are rounded.
/// Greys have hue and (for black) saturation zero.
#[must_use]
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> [u8; 3] {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let v = r.max(g).max(b);
    let diff = v - r.min(g).min(b);

    let s = if v == 0 {
        0
    } else {
        (2 * 255 * diff + v) / (2 * v)
    };

    let h = if diff == 0 {
        0
    } else {
        // Numerator in sixths of the hue circle, scaled by `diff`.
        let sector = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let h = (60 * sector + diff).div_euclid(2 * diff);
        if h < 0 { h + 180 } else { h }
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    [h as u8, s as u8, v as u8]
}

/// Binary mask of pixels whose HSV lies inside `[lower, upper]` on every
/// channel.
#[must_use]
pub fn skin_mask(image: &RgbImage, lower: [u8; 3], upper: [u8; 3]) -> GrayImage {
    imageproc::map::map_pixels(image, |p| {
        let hsv = rgb_to_hsv(p.0);
        let inside = hsv
            .iter()
            .zip(lower.iter().zip(&upper))
            .all(|(c, (lo, hi))| lo <= c && c <= hi);
        Luma([if inside { 255 } else { 0 }])
    })
}

/// Opening then closing with a `(2r+1)×(2r+1)` square.
///
/// Opening removes specks smaller than the element; closing fills
/// gaps narrower than it.
#[must_use]
pub fn clean_mask(mask: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return mask.clone();
    }
    let opened = imageproc::morphology::open(mask, Norm::LInf, radius);
    imageproc::morphology::close(&opened, Norm::LInf, radius)
}

/// Rasterize a contour, interior and boundary, into a fresh mask.
#[must_use]
pub fn fill_contour(contour: &HandContour, width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    let white = Luma([255u8]);

    let mut polygon: Vec<Point<i32>> = contour
        .points()
        .iter()
        .map(|p| Point::new(p.x, p.y))
        .collect();
    // The polygon filler wants an open ring.
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }
    if polygon.len() >= 3 {
        imageproc::drawing::draw_polygon_mut(&mut mask, &polygon, white);
    } else if let [a, b] = polygon.as_slice() {
        #[allow(clippy::cast_precision_loss)]
        imageproc::drawing::draw_line_segment_mut(
            &mut mask,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            white,
        );
    }

    for p in contour.points() {
        if let (Ok(x), Ok(y)) = (u32::try_from(p.x), u32::try_from(p.y))
            && x < width
            && y < height
        {
            mask.put_pixel(x, y, white);
        }
    }
    mask
}

/// Find the hand: the largest cleaned skin-coloured region.
///
/// Returns `None` when no skin-coloured pixels survive cleanup.
#[must_use]
pub fn segment_hand(image: &RgbImage, config: &AnalysisConfig) -> Option<HandRegion> {
    let raw = skin_mask(image, config.skin_lower, config.skin_upper);
    let cleaned = clean_mask(&raw, config.cleanup_radius);
    let contour = contour::largest_contour(contour::external_contours(&cleaned))?;
    let mask = fill_contour(&contour, image.width(), image.height());
    Some(HandRegion { mask, contour })
}
