//! Progressive probabilistic Hough transform.
//!
//! Edge pixels are visited in pseudo-random order. Each one votes into a
//! `(theta, rho)` accumulator (1° by 1 px). As soon as a bin reaches the
//! vote threshold, the detector walks from the current pixel along that
//! line in both directions, tolerating gaps of up to `max_gap` pixels,
//! and accepts the walked span if it is long enough on either axis.
//! Accepted pixels are removed from both the edge set and the
//! accumulator, so each stroke is reported once.
//!
//! The visit order comes from a fixed-seed multiply-with-carry generator,
//! so results are reproducible for identical input.

use image::GrayImage;

use crate::types::{AnalysisConfig, LineSegment};

/// Number of angle bins (1° resolution over a half turn).
const NUM_ANGLES: usize = 180;

/// Fractional bits of the fixed-point line walker.
const SHIFT: u32 = 16;

/// Largest side length the 16.16 walker can address.
pub const MAX_SIDE: u32 = (1 << (31 - SHIFT)) - 2;

/// Segment detector parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoughParams {
    /// Minimum accumulator votes before a line is traced.
    pub threshold: u32,
    /// Minimum extent of a segment along x or y, in pixels.
    pub min_line_length: u32,
    /// Maximum run of missing pixels bridged within one segment.
    pub max_line_gap: u32,
}

impl HoughParams {
    /// Parameters taken from an analysis configuration.
    #[must_use]
    pub const fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            threshold: config.hough_threshold,
            min_line_length: config.hough_min_length,
            max_line_gap: config.hough_max_gap,
        }
    }
}

/// Multiply-with-carry generator with a 32-bit multiplier.
#[derive(Debug, Clone)]
struct Mwc {
    state: u64,
}

impl Mwc {
    const MULTIPLIER: u64 = 4_164_903_690;

    const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0xffff_ffff } else { seed },
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn next_u32(&mut self) -> u32 {
        self.state = (self.state & 0xffff_ffff) * Self::MULTIPLIER + (self.state >> 32);
        self.state as u32
    }

    /// Uniform index in `0..bound`. `bound` must be non-zero.
    fn below(&mut self, bound: usize) -> usize {
        self.next_u32() as usize % bound
    }
}

/// Precomputed `cos`/`sin` per angle bin.
struct TrigTable {
    cos: [f32; NUM_ANGLES],
    sin: [f32; NUM_ANGLES],
}

impl TrigTable {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn new() -> Self {
        let step = std::f64::consts::PI / NUM_ANGLES as f64;
        let mut cos = [0.0; NUM_ANGLES];
        let mut sin = [0.0; NUM_ANGLES];
        for n in 0..NUM_ANGLES {
            let theta = n as f64 * step;
            cos[n] = theta.cos() as f32;
            sin[n] = theta.sin() as f32;
        }
        Self { cos, sin }
    }
}

/// Vote accumulator over `(angle, rho)`.
struct Accumulator {
    votes: Vec<i32>,
    num_rho: usize,
    trig: TrigTable,
}

impl Accumulator {
    fn new(width: u32, height: u32) -> Self {
        let num_rho = ((width as usize + height as usize) * 2) + 1;
        Self {
            votes: vec![0; NUM_ANGLES * num_rho],
            num_rho,
            trig: TrigTable::new(),
        }
    }

    /// Bin index of `(x, y)` at angle `n`.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn rho_index(&self, n: usize, x: i32, y: i32) -> usize {
        let r = (x as f32)
            .mul_add(self.trig.cos[n], y as f32 * self.trig.sin[n])
            .round_ties_even() as i64;
        let offset = ((self.num_rho - 1) / 2) as i64;
        (r + offset).clamp(0, self.num_rho as i64 - 1) as usize
    }

    /// Vote for every line through `(x, y)`; return the strongest bin's
    /// votes and angle. The lowest angle wins a tie.
    fn vote(&mut self, x: i32, y: i32) -> (i32, usize) {
        let mut best = (i32::MIN, 0);
        for n in 0..NUM_ANGLES {
            let idx = n * self.num_rho + self.rho_index(n, x, y);
            self.votes[idx] += 1;
            if self.votes[idx] > best.0 {
                best = (self.votes[idx], n);
            }
        }
        best
    }

    /// Withdraw the votes of `(x, y)`.
    fn unvote(&mut self, x: i32, y: i32) {
        for n in 0..NUM_ANGLES {
            let idx = n * self.num_rho + self.rho_index(n, x, y);
            self.votes[idx] -= 1;
        }
    }
}

/// Fixed-point stepping along a line: one axis advances by whole pixels,
/// the other by a 16.16 increment.
#[derive(Debug, Clone, Copy)]
struct Walker {
    x0: i32,
    y0: i32,
    dx: i32,
    dy: i32,
    x_major: bool,
}

impl Walker {
    /// Walker through `(x, y)` along the line normal to angle bin `n`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn new(trig: &TrigTable, n: usize, x: i32, y: i32) -> Self {
        let a = -trig.sin[n];
        let b = trig.cos[n];
        let one = (1_i32 << SHIFT) as f32;
        let half = 1_i32 << (SHIFT - 1);
        if a.abs() > b.abs() {
            Self {
                x0: x,
                y0: (y << SHIFT) + half,
                dx: if a > 0.0 { 1 } else { -1 },
                dy: (b * one / a.abs()).round_ties_even() as i32,
                x_major: true,
            }
        } else {
            Self {
                x0: (x << SHIFT) + half,
                y0: y,
                dx: (a * one / b.abs()).round_ties_even() as i32,
                dy: if b > 0.0 { 1 } else { -1 },
                x_major: false,
            }
        }
    }

    /// Pixel positions in `direction` 0 (forward) or 1 (backward),
    /// starting at the seed pixel. Unbounded; callers stop it.
    fn steps(self, direction: usize) -> impl Iterator<Item = (i32, i32)> {
        let (dx, dy) = if direction == 0 {
            (self.dx, self.dy)
        } else {
            (-self.dx, -self.dy)
        };
        let x_major = self.x_major;
        std::iter::successors(Some((self.x0, self.y0)), move |&(x, y)| {
            Some((x + dx, y + dy))
        })
        .map(move |(x, y)| {
            if x_major {
                (x, y >> SHIFT)
            } else {
                (x >> SHIFT, y)
            }
        })
    }
}

/// Detect line segments in a binary edge map (non-zero = edge).
///
/// Segments are returned in detection order with endpoints as walked:
/// the forward end first. Maps with a side longer than [`MAX_SIDE`] are
/// skipped.
#[must_use]
pub fn detect_segments(edges: &GrayImage, params: HoughParams) -> Vec<LineSegment> {
    let (width, height) = edges.dimensions();
    if width == 0 || height == 0 {
        return Vec::new();
    }
    if width > MAX_SIDE || height > MAX_SIDE {
        tracing::warn!(width, height, "edge map too large for segment detection");
        return Vec::new();
    }
    let (Ok(w), Ok(h)) = (i32::try_from(width), i32::try_from(height)) else {
        return Vec::new();
    };

    let mut mask: Vec<bool> = edges.pixels().map(|p| p.0[0] != 0).collect();
    let mut points: Vec<(i32, i32)> = edges
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] != 0)
        .filter_map(|(x, y, _)| Some((i32::try_from(x).ok()?, i32::try_from(y).ok()?)))
        .collect();

    #[allow(clippy::cast_sign_loss)]
    let at = |x: i32, y: i32| (y as usize) * (w as usize) + x as usize;
    let inside = |x: i32, y: i32| x >= 0 && x < w && y >= 0 && y < h;
    let threshold = i32::try_from(params.threshold).unwrap_or(i32::MAX);
    let max_gap = params.max_line_gap;
    let min_len = i64::from(params.min_line_length);

    let mut acc = Accumulator::new(width, height);
    let mut rng = Mwc::new(u64::MAX);
    let mut segments = Vec::new();

    while !points.is_empty() {
        let idx = rng.below(points.len());
        let (x, y) = points.swap_remove(idx);

        // Already consumed by an earlier segment.
        if !mask[at(x, y)] {
            continue;
        }

        let (votes, n) = acc.vote(x, y);
        if votes < threshold {
            continue;
        }

        let walker = Walker::new(&acc.trig, n, x, y);
        let mut ends = [(x, y); 2];
        for (k, end) in ends.iter_mut().enumerate() {
            let mut gap = 0;
            for (px, py) in walker.steps(k) {
                if !inside(px, py) {
                    break;
                }
                if mask[at(px, py)] {
                    gap = 0;
                    *end = (px, py);
                } else {
                    gap += 1;
                    if gap > max_gap {
                        break;
                    }
                }
            }
        }

        let good = (i64::from(ends[1].0) - i64::from(ends[0].0)).abs() >= min_len
            || (i64::from(ends[1].1) - i64::from(ends[0].1)).abs() >= min_len;

        for (k, &end) in ends.iter().enumerate() {
            for (px, py) in walker.steps(k) {
                if !inside(px, py) {
                    break;
                }
                let i = at(px, py);
                if mask[i] {
                    if good {
                        acc.unvote(px, py);
                    }
                    mask[i] = false;
                }
                if (px, py) == end {
                    break;
                }
            }
        }

        if good {
            segments.push(LineSegment::new(ends[0].0, ends[0].1, ends[1].0, ends[1].1));
        }
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> HoughParams {
        HoughParams::from_config(&AnalysisConfig::default())
    }

    fn draw_vertical(img: &mut GrayImage, x: u32, ys: std::ops::Range<u32>) {
        for y in ys {
            img.put_pixel(x, y, image::Luma([255]));
        }
    }

    #[test]
    fn generator_is_deterministic() {
        let mut a = Mwc::new(u64::MAX);
        let mut b = Mwc::new(u64::MAX);
        let xs: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
        assert_eq!(xs, ys);
        assert!(xs.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn empty_map_has_no_segments() {
        assert!(detect_segments(&GrayImage::new(50, 50), params()).is_empty());
        assert!(detect_segments(&GrayImage::new(0, 0), params()).is_empty());
    }

    #[test]
    fn vertical_stroke_is_one_segment() {
        let mut img = GrayImage::new(200, 200);
        draw_vertical(&mut img, 50, 50..150);
        let segments = detect_segments(&img, params());
        assert_eq!(segments.len(), 1);
        let s = segments[0];
        assert_eq!((s.x1, s.x2), (50, 50));
        assert_eq!((s.y1.min(s.y2), s.y1.max(s.y2)), (50, 149));
    }

    #[test]
    fn short_stroke_never_reaches_threshold() {
        let mut img = GrayImage::new(100, 100);
        draw_vertical(&mut img, 30, 10..25);
        assert!(detect_segments(&img, params()).is_empty());
    }

    #[test]
    fn small_gap_is_bridged() {
        let mut img = GrayImage::new(100, 150);
        draw_vertical(&mut img, 30, 20..61);
        draw_vertical(&mut img, 30, 66..111);
        let segments = detect_segments(&img, params());
        assert_eq!(segments.len(), 1);
        let s = segments[0];
        assert_eq!((s.y1.min(s.y2), s.y1.max(s.y2)), (20, 110));
    }

    #[test]
    fn segments_stay_inside_image() {
        let mut img = GrayImage::new(60, 60);
        for i in 0..60 {
            img.put_pixel(i, i, image::Luma([255]));
            img.put_pixel(59 - i, i, image::Luma([255]));
        }
        for s in detect_segments(&img, params()) {
            for (x, y) in [(s.x1, s.y1), (s.x2, s.y2)] {
                assert!((0..60).contains(&x) && (0..60).contains(&y));
            }
        }
    }

    #[test]
    fn same_input_same_output() {
        let mut img = GrayImage::new(80, 80);
        for i in 5..75 {
            img.put_pixel(i, 40, image::Luma([255]));
            img.put_pixel(20, i, image::Luma([255]));
        }
        assert_eq!(detect_segments(&img, params()), detect_segments(&img, params()));
    }
}
