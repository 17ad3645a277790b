//! Histogram-based contrast normalization.
//!
//! [`clahe`] is contrast-limited adaptive histogram equalization: the
//! image is split into a grid of tiles, each tile gets its own clipped
//! equalization lookup table, and every output pixel bilinearly blends
//! the tables of the four nearest tile centres. `imageproc` only ships
//! global equalization ([`imageproc::contrast::equalize_histogram`]), so
//! the adaptive variant is implemented here.

use image::{GrayImage, Luma};

const BINS: usize = 256;

/// Global histogram equalization.
#[must_use = "returns the equalized image"]
pub fn equalize_global(image: &GrayImage) -> GrayImage {
    imageproc::contrast::equalize_histogram(image)
}

/// Contrast-limited adaptive histogram equalization.
///
/// `tiles` is the number of tiles per axis and `clip_limit` is relative
/// to a uniform histogram (2.0 lets a bin hold twice its fair share
/// before the excess is redistributed). When the dimensions are not a
/// multiple of `tiles`, the histogram source is padded on the right and
/// bottom by mirroring without repeating the edge pixel.
///
/// `tiles` is clamped to `1..=min(width, height)`.
#[must_use = "returns the equalized image"]
pub fn clahe(image: &GrayImage, clip_limit: f32, tiles: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let tiles = tiles.clamp(1, width.min(height));

    let padded_w = width.div_ceil(tiles) * tiles;
    let padded_h = height.div_ceil(tiles) * tiles;
    let tile_w = padded_w / tiles;
    let tile_h = padded_h / tiles;
    let tile_area = tile_w * tile_h;

    let clip = clip_count(clip_limit, tile_area);
    #[allow(clippy::cast_precision_loss)]
    let lut_scale = (BINS - 1) as f32 / tile_area as f32;

    let mut luts = Vec::with_capacity((tiles * tiles) as usize);
    for ty in 0..tiles {
        for tx in 0..tiles {
            let mut hist = [0u32; BINS];
            for y in ty * tile_h..(ty + 1) * tile_h {
                let sy = reflect_101(y, height);
                for x in tx * tile_w..(tx + 1) * tile_w {
                    let sx = reflect_101(x, width);
                    hist[usize::from(image.get_pixel(sx, sy).0[0])] += 1;
                }
            }
            if let Some(limit) = clip {
                clip_histogram(&mut hist, limit);
            }
            luts.push(cumulative_lut(&hist, lut_scale));
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let (inv_tw, inv_th) = (1.0 / tile_w as f32, 1.0 / tile_h as f32);
    let last = tiles - 1;

    GrayImage::from_fn(width, height, |x, y| {
        #[allow(clippy::cast_precision_loss)]
        let (tx1, tx2, xa) = neighbour_tiles(x as f32 * inv_tw - 0.5, last);
        #[allow(clippy::cast_precision_loss)]
        let (ty1, ty2, ya) = neighbour_tiles(y as f32 * inv_th - 0.5, last);
        let v = usize::from(image.get_pixel(x, y).0[0]);
        let lut = |ty: u32, tx: u32| f32::from(luts[(ty * tiles + tx) as usize][v]);

        let top = lut(ty1, tx1).mul_add(1.0 - xa, lut(ty1, tx2) * xa);
        let bottom = lut(ty2, tx1).mul_add(1.0 - xa, lut(ty2, tx2) * xa);
        Luma([saturate_u8(top.mul_add(1.0 - ya, bottom * ya))])
    })
}

/// Absolute per-bin limit, or `None` when clipping is disabled.
fn clip_count(clip_limit: f32, tile_area: u32) -> Option<u32> {
    if clip_limit.is_nan() || clip_limit <= 0.0 {
        return None;
    }
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let limit = (clip_limit * tile_area as f32 / BINS as f32) as u32;
    Some(limit.max(1))
}

/// Clip every bin at `limit` and spread the excess evenly, handing any
/// remainder out one count at a time at a fixed stride.
fn clip_histogram(hist: &mut [u32; BINS], limit: u32) {
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    let bins = BINS as u32;
    let batch = excess / bins;
    let mut residual = excess - batch * bins;
    for bin in hist.iter_mut() {
        *bin += batch;
    }

    if residual > 0 {
        let step = (BINS / residual as usize).max(1);
        let mut i = 0;
        while i < BINS && residual > 0 {
            hist[i] += 1;
            i += step;
            residual -= 1;
        }
    }
}

fn cumulative_lut(hist: &[u32; BINS], scale: f32) -> [u8; BINS] {
    let mut lut = [0u8; BINS];
    let mut sum = 0u32;
    for (out, &count) in lut.iter_mut().zip(hist) {
        sum += count;
        #[allow(clippy::cast_precision_loss)]
        let value = sum as f32 * scale;
        *out = saturate_u8(value);
    }
    lut
}

/// Left/right tile indices and the blend weight toward the right one.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn neighbour_tiles(pos: f32, last: u32) -> (u32, u32, f32) {
    let lower = pos.floor();
    let weight = pos - lower;
    let lower = lower as i64;
    let first = lower.max(0) as u32;
    let second = ((lower + 1).max(0) as u32).min(last);
    (first.min(last), second, weight)
}

/// Mirror `i` into `0..n` without repeating the border pixel
/// (`... 2 1 | 0 1 2 ... n-1 | n-2 n-3 ...`).
const fn reflect_101(i: u32, n: u32) -> u32 {
    if n == 1 {
        return 0;
    }
    let period = 2 * n - 2;
    let i = i % period;
    if i >= n { period - i } else { i }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn saturate_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_101_mirrors_without_repeating_edge() {
        assert_eq!(reflect_101(0, 5), 0);
        assert_eq!(reflect_101(4, 5), 4);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(8, 5), 0);
        assert_eq!(reflect_101(9, 5), 1);
        assert_eq!(reflect_101(7, 1), 0);
    }

    #[test]
    fn clip_count_has_floor_of_one() {
        assert_eq!(clip_count(2.0, 64), Some(1));
        assert_eq!(clip_count(2.0, 1024), Some(8));
        assert_eq!(clip_count(0.0, 1024), None);
    }

    #[test]
    fn clipping_preserves_total_count() {
        let mut hist = [0u32; BINS];
        hist[10] = 1000;
        hist[200] = 24;
        clip_histogram(&mut hist, 8);
        assert_eq!(hist.iter().sum::<u32>(), 1024);
        assert!(hist.iter().all(|&c| c <= 8 + 1024 / 256 + 1));
    }

    #[test]
    fn output_dimensions_preserved() {
        let img = GrayImage::from_fn(37, 23, |x, y| Luma([((x * 7 + y * 3) % 256) as u8]));
        let out = clahe(&img, 2.0, 8);
        assert_eq!(out.dimensions(), (37, 23));
    }

    #[test]
    fn uniform_image_stays_uniform() {
        let img = GrayImage::from_pixel(64, 64, Luma([90]));
        let out = clahe(&img, 2.0, 8);
        let first = out.get_pixel(0, 0).0[0];
        assert!(out.pixels().all(|p| p.0[0] == first));
    }

    #[test]
    fn low_contrast_ramp_is_stretched() {
        // Values 100..=115 across the image; equalization widens the range.
        let img = GrayImage::from_fn(64, 64, |x, _| Luma([100 + (x / 4) as u8]));
        let out = clahe(&img, 2.0, 2);
        let min = out.pixels().map(|p| p.0[0]).min().unwrap_or(0);
        let max = out.pixels().map(|p| p.0[0]).max().unwrap_or(0);
        assert!(max - min > 15, "expected wider range, got {min}..={max}");
    }

    #[test]
    fn clahe_is_monotonic_within_a_tile() {
        // A single tile is plain clipped equalization: brighter in,
        // brighter (or equal) out.
        let img = GrayImage::from_fn(16, 16, |x, y| Luma([(x * 16 + y) as u8]));
        let out = clahe(&img, 2.0, 1);
        let mut pairs: Vec<(u8, u8)> = img
            .pixels()
            .zip(out.pixels())
            .map(|(a, b)| (a.0[0], b.0[0]))
            .collect();
        pairs.sort_unstable();
        assert!(pairs.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn tiny_image_with_many_tiles() {
        let img = GrayImage::from_fn(3, 2, |x, _| Luma([(x * 100) as u8]));
        let out = clahe(&img, 2.0, 8);
        assert_eq!(out.dimensions(), (3, 2));
    }

    #[test]
    fn huge_tile_count_is_clamped_to_image() {
        let img = GrayImage::from_fn(8, 8, |x, y| Luma([(x * 16 + y) as u8]));
        let out = clahe(&img, 2.0, 70_000);
        assert_eq!(out.dimensions(), (8, 8));
        assert_eq!(out, clahe(&img, 2.0, 8));
    }

    #[test]
    fn global_equalization_preserves_dimensions() {
        let img = GrayImage::from_fn(9, 4, |x, _| Luma([(x * 20) as u8]));
        assert_eq!(equalize_global(&img).dimensions(), (9, 4));
    }
}
