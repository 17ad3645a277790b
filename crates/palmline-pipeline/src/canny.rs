//! Canny edge detection without the built-in Gaussian pass.
//!
//! Derived from `imageproc::edges::canny` (0.26) with these differences:
//!
//! 1. **No internal blur.** The input is already a smoothed, enhanced
//!    ridge image; blurring it again would erase thin creases.
//! 2. **L1 gradient magnitude** (`|gx| + |gy|`), so thresholds are on the
//!    same scale as the classic 30/100 pair.
//! 3. **Hysteresis visits all 8 neighbours with bounds checks.** Upstream
//!    only checks 6 of them and underflows at `x = 0` / `y = 0`
//!    (<https://github.com/image-rs/imageproc/issues/705>).

use image::{GrayImage, Luma};
use imageproc::definitions::Image;
use imageproc::filter::filter_clamped;
use imageproc::kernel;

/// Detect edges in `image`.
///
/// Pixels whose suppressed gradient exceeds `high_threshold` seed edges;
/// pixels exceeding `low_threshold` join an edge when 8-connected to one.
/// Returns a binary image: 255 for edge pixels, 0 for non-edge. Images
/// narrower or shorter than three pixels have no interior and yield an
/// empty map.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return GrayImage::new(width, height);
    }

    let gx: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_HORIZONTAL_3X3);
    let gy: Image<Luma<i16>> = filter_clamped(image, kernel::SOBEL_VERTICAL_3X3);
    let magnitude: Image<Luma<f32>> = Image::from_fn(width, height, |x, y| {
        let h = f32::from(gx.get_pixel(x, y).0[0]);
        let v = f32::from(gy.get_pixel(x, y).0[0]);
        Luma([h.abs() + v.abs()])
    });

    let thinned = non_maximum_suppression(&magnitude, &gx, &gy);
    hysteresis(&thinned, low_threshold, high_threshold)
}

/// Keep only pixels that are local maxima across the gradient direction.
fn non_maximum_suppression(
    g: &Image<Luma<f32>>,
    gx: &Image<Luma<i16>>,
    gy: &Image<Luma<i16>>,
) -> Image<Luma<f32>> {
    let mut out = Image::from_pixel(g.width(), g.height(), Luma([0.0]));
    for y in 1..g.height() - 1 {
        for x in 1..g.width() - 1 {
            let mut angle = f32::from(gy.get_pixel(x, y).0[0])
                .atan2(f32::from(gx.get_pixel(x, y).0[0]))
                .to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }

            // Neighbours on either side, along the quantized gradient.
            let (a, b) = if !(22.5..157.5).contains(&angle) {
                ((x - 1, y), (x + 1, y))
            } else if angle < 67.5 {
                ((x + 1, y + 1), (x - 1, y - 1))
            } else if angle < 112.5 {
                ((x, y - 1), (x, y + 1))
            } else {
                ((x - 1, y + 1), (x + 1, y - 1))
            };

            let pixel = g.get_pixel(x, y).0[0];
            if pixel >= g.get_pixel(a.0, a.1).0[0] && pixel >= g.get_pixel(b.0, b.1).0[0] {
                out.put_pixel(x, y, Luma([pixel]));
            }
        }
    }
    out
}

/// Double-threshold with connectivity, as a depth-first flood from every
/// strong pixel.
fn hysteresis(input: &Image<Luma<f32>>, low: f32, high: f32) -> GrayImage {
    let (w, h) = input.dimensions();
    let mut out = GrayImage::new(w, h);
    let mut stack = Vec::new();

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            if input.get_pixel(x, y).0[0] <= high || out.get_pixel(x, y).0[0] != 0 {
                continue;
            }
            out.put_pixel(x, y, Luma([255]));
            stack.push((x, y));

            while let Some((nx, ny)) = stack.pop() {
                let neighbours = [
                    (nx.wrapping_sub(1), ny.wrapping_sub(1)),
                    (nx, ny.wrapping_sub(1)),
                    (nx + 1, ny.wrapping_sub(1)),
                    (nx.wrapping_sub(1), ny),
                    (nx + 1, ny),
                    (nx.wrapping_sub(1), ny + 1),
                    (nx, ny + 1),
                    (nx + 1, ny + 1),
                ];
                for (px, py) in neighbours {
                    // wrapping_sub turns -1 into u32::MAX, caught here too.
                    if px >= w || py >= h {
                        continue;
                    }
                    if input.get_pixel(px, py).0[0] > low && out.get_pixel(px, py).0[0] == 0 {
                        out.put_pixel(px, py, Luma([255]));
                        stack.push((px, py));
                    }
                }
            }
        }
    }
    out
}
