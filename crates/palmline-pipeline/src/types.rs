//! Shared types for the palmline analysis pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference the
/// original decoded image without depending on `image` directly.
pub use image::RgbImage;

/// Per-pixel gradient direction in radians (`atan2(gy, gx)`).
pub type DirectionMap = image::ImageBuffer<image::Luma<f32>, Vec<f32>>;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total number of pixels.
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

// ───────────────────────── Hand region ───────────────────────────────

/// An integer point on a contour, in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContourPoint {
    /// Column (pixels from left edge).
    pub x: i32,
    /// Row (pixels from top edge).
    pub y: i32,
}

impl ContourPoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box with inclusive pixel extents, so a single
/// pixel has `width == height == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl BoundingBox {
    /// Area in pixels.
    #[must_use]
    pub fn area(self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }
}

/// Ordered boundary of the largest skin-coloured region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandContour(Vec<ContourPoint>);

impl HandContour {
    /// Create a contour from its boundary points.
    #[must_use]
    pub const fn new(points: Vec<ContourPoint>) -> Self {
        Self(points)
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of boundary points.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[ContourPoint] {
        &self.0
    }

    /// Axis-aligned bounding box, or `None` for an empty contour.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.0.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.0[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(BoundingBox {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }
}

/// The detected hand: a filled binary mask plus the boundary it was
/// rasterized from.
///
/// Segmentation either finds both or neither, so they travel together
/// as `Option<HandRegion>`.
#[derive(Debug, Clone)]
pub struct HandRegion {
    /// Binary mask, 255 inside the hand and 0 elsewhere.
    pub mask: GrayImage,
    /// Boundary of the hand region.
    pub contour: HandContour,
}

// ───────────────────────── Lines ─────────────────────────────────────

/// A raw detected segment with integer endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSegment {
    /// Start column.
    pub x1: i32,
    /// Start row.
    pub y1: i32,
    /// End column.
    pub x2: i32,
    /// End row.
    pub y2: i32,
}

impl LineSegment {
    /// Create a new segment.
    #[must_use]
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Euclidean length in pixels.
    #[must_use]
    pub fn length(self) -> f64 {
        f64::from(self.x2 - self.x1).hypot(f64::from(self.y2 - self.y1))
    }

    /// Orientation in degrees, `|atan2(dy, dx)|`, so always in `[0, 180]`.
    ///
    /// Reversing the endpoints maps `a` to `180 - a`.
    #[must_use]
    pub fn angle_degrees(self) -> f64 {
        f64::from(self.y2 - self.y1)
            .atan2(f64::from(self.x2 - self.x1))
            .to_degrees()
            .abs()
    }

    /// Midpoint in (possibly fractional) pixel coordinates.
    #[must_use]
    pub fn midpoint(self) -> (f64, f64) {
        (
            f64::from(self.x1 + self.x2) / 2.0,
            f64::from(self.y1 + self.y2) / 2.0,
        )
    }
}

/// Geometric classification of a palm line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineClass {
    /// Long line running roughly top-to-bottom.
    MajorVertical,
    /// Long line in any other accepted orientation.
    MajorHorizontal,
    /// Mid-length line.
    Medium,
    /// Short line.
    Minor,
}

impl LineClass {
    /// Every class, in reporting order.
    pub const ALL: [Self; 4] = [
        Self::MajorVertical,
        Self::MajorHorizontal,
        Self::Medium,
        Self::Minor,
    ];

    /// Lines strictly longer than this are major.
    pub const MAJOR_LENGTH: f64 = 80.0;

    /// Lines strictly longer than this (and not major) are medium.
    pub const MEDIUM_LENGTH: f64 = 40.0;

    /// Classify a line from its length (pixels) and angle (degrees).
    #[must_use]
    pub fn from_geometry(length: f64, angle: f64) -> Self {
        if length > Self::MAJOR_LENGTH {
            if angle > 70.0 && angle < 110.0 {
                Self::MajorVertical
            } else {
                Self::MajorHorizontal
            }
        } else if length > Self::MEDIUM_LENGTH {
            Self::Medium
        } else {
            Self::Minor
        }
    }

    /// Wire name of the class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MajorVertical => "major_vertical",
            Self::MajorHorizontal => "major_horizontal",
            Self::Medium => "medium",
            Self::Minor => "minor",
        }
    }

    /// Whether this is one of the two major classes.
    #[must_use]
    pub const fn is_major(self) -> bool {
        matches!(self, Self::MajorVertical | Self::MajorHorizontal)
    }
}

impl std::fmt::Display for LineClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified line. Fields are fixed at construction: candidates are
/// filtered or merged, never edited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineCandidate {
    segment: LineSegment,
    length: f64,
    angle: f64,
    class: LineClass,
}

impl LineCandidate {
    /// Derive length, angle, and class from a segment.
    #[must_use]
    pub fn new(segment: LineSegment) -> Self {
        let length = segment.length();
        let angle = segment.angle_degrees();
        Self {
            segment,
            length,
            angle,
            class: LineClass::from_geometry(length, angle),
        }
    }

    /// The underlying segment.
    #[must_use]
    pub const fn segment(&self) -> LineSegment {
        self.segment
    }

    /// Length in pixels.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Angle in degrees, in `[0, 180]`.
    #[must_use]
    pub const fn angle(&self) -> f64 {
        self.angle
    }

    /// Classification tag.
    #[must_use]
    pub const fn class(&self) -> LineClass {
        self.class
    }
}

// ───────────────────────── Grid ──────────────────────────────────────

/// Number of rows and columns in the palm grid.
pub const GRID_SIZE: usize = 4;

/// One cell of the 4×4 palm grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridRegion {
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Cell width in pixels.
    pub width: i32,
    /// Cell height in pixels.
    pub height: i32,
    /// Row index, `0..4`, top to bottom.
    pub row: usize,
    /// Column index, `0..4`, left to right.
    pub col: usize,
}

/// The sixteen cells covering the hand's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PalmGrid {
    /// Cells in column-major order (`col` outer, `row` inner).
    pub regions: [GridRegion; GRID_SIZE * GRID_SIZE],
}

impl PalmGrid {
    /// Look up the cell at `(row, col)`.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&GridRegion> {
        self.regions.iter().find(|r| r.row == row && r.col == col)
    }
}

// ───────────────────────── Configuration ─────────────────────────────

/// Tunable parameters of the analysis pipeline.
///
/// Defaults reproduce the reference palm detector. Line classification
/// and the geometric filter are fixed constants and deliberately not
/// part of this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// CLAHE clip limit, relative to a uniform histogram.
    pub clahe_clip_limit: f32,

    /// CLAHE tiles per axis.
    pub clahe_tile_grid: u32,

    /// Inclusive lower HSV bound for skin (`[h, s, v]`, H in `0..180`).
    pub skin_lower: [u8; 3],

    /// Inclusive upper HSV bound for skin.
    pub skin_upper: [u8; 3],

    /// Radius of the square structuring element used to clean the skin
    /// mask. 2 gives a 5×5 element.
    pub cleanup_radius: u8,

    /// Canny low threshold on the L1 gradient.
    pub canny_low: f32,

    /// Canny high threshold on the L1 gradient.
    pub canny_high: f32,

    /// Minimum accumulator votes for a Hough line.
    pub hough_threshold: u32,

    /// Minimum length of an accepted Hough segment, in pixels.
    pub hough_min_length: u32,

    /// Maximum gap bridged within one Hough segment, in pixels.
    pub hough_max_gap: u32,

    /// DBSCAN neighbourhood radius over `(mid_x, mid_y, angle)`.
    pub cluster_eps: f64,

    /// DBSCAN minimum neighbourhood size (the point itself included).
    pub cluster_min_samples: usize,
}

impl AnalysisConfig {
    /// Default CLAHE clip limit.
    pub const DEFAULT_CLAHE_CLIP_LIMIT: f32 = 2.0;
    /// Default CLAHE tile grid.
    pub const DEFAULT_CLAHE_TILE_GRID: u32 = 8;
    /// Largest accepted CLAHE grid side.
    pub const MAX_CLAHE_TILE_GRID: u32 = 256;
    /// Default lower skin bound.
    pub const DEFAULT_SKIN_LOWER: [u8; 3] = [0, 20, 70];
    /// Default upper skin bound.
    pub const DEFAULT_SKIN_UPPER: [u8; 3] = [20, 255, 255];
    /// Default cleanup radius (5×5 element).
    pub const DEFAULT_CLEANUP_RADIUS: u8 = 2;
    /// Default Canny low threshold.
    pub const DEFAULT_CANNY_LOW: f32 = 30.0;
    /// Default Canny high threshold.
    pub const DEFAULT_CANNY_HIGH: f32 = 100.0;
    /// Default Hough vote threshold.
    pub const DEFAULT_HOUGH_THRESHOLD: u32 = 20;
    /// Default Hough minimum segment length.
    pub const DEFAULT_HOUGH_MIN_LENGTH: u32 = 30;
    /// Default Hough maximum gap.
    pub const DEFAULT_HOUGH_MAX_GAP: u32 = 10;
    /// Default clustering radius.
    pub const DEFAULT_CLUSTER_EPS: f64 = 30.0;
    /// Default clustering minimum samples.
    pub const DEFAULT_CLUSTER_MIN_SAMPLES: usize = 2;

    /// Check parameter invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidConfig`] naming the first
    /// violated invariant.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let invalid = |msg: &str| Err(AnalysisError::InvalidConfig(msg.to_string()));

        if self.clahe_clip_limit.is_nan() || self.clahe_clip_limit <= 0.0 {
            return invalid("clahe_clip_limit must be positive");
        }
        if self.clahe_tile_grid == 0 || self.clahe_tile_grid > Self::MAX_CLAHE_TILE_GRID {
            return invalid("clahe_tile_grid must be between 1 and 256");
        }
        if self
            .skin_lower
            .iter()
            .zip(&self.skin_upper)
            .any(|(lo, hi)| lo > hi)
        {
            return invalid("skin_lower must not exceed skin_upper");
        }
        if !self.canny_high.is_finite() {
            return invalid("canny_high must be finite");
        }
        if self.canny_low.is_nan() || self.canny_low < 0.0 || self.canny_low > self.canny_high {
            return invalid("canny thresholds must satisfy 0 <= canny_low <= canny_high");
        }
        if self.hough_threshold == 0 {
            return invalid("hough_threshold must be at least 1");
        }
        if self.cluster_eps.is_nan() || self.cluster_eps <= 0.0 {
            return invalid("cluster_eps must be positive");
        }
        if self.cluster_min_samples == 0 {
            return invalid("cluster_min_samples must be at least 1");
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            clahe_clip_limit: Self::DEFAULT_CLAHE_CLIP_LIMIT,
            clahe_tile_grid: Self::DEFAULT_CLAHE_TILE_GRID,
            skin_lower: Self::DEFAULT_SKIN_LOWER,
            skin_upper: Self::DEFAULT_SKIN_UPPER,
            cleanup_radius: Self::DEFAULT_CLEANUP_RADIUS,
            canny_low: Self::DEFAULT_CANNY_LOW,
            canny_high: Self::DEFAULT_CANNY_HIGH,
            hough_threshold: Self::DEFAULT_HOUGH_THRESHOLD,
            hough_min_length: Self::DEFAULT_HOUGH_MIN_LENGTH,
            hough_max_gap: Self::DEFAULT_HOUGH_MAX_GAP,
            cluster_eps: Self::DEFAULT_CLUSTER_EPS,
            cluster_min_samples: Self::DEFAULT_CLUSTER_MIN_SAMPLES,
        }
    }
}

// ───────────────────────── Result ────────────────────────────────────

/// Everything produced by one analysis call.
///
/// Built once by the orchestrator and read-only afterwards; the
/// renderer and the report layer only borrow it.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    original: RgbImage,
    enhanced: GrayImage,
    direction: DirectionMap,
    lines: Vec<LineCandidate>,
    hand: Option<HandRegion>,
    grid: Option<PalmGrid>,
}

impl AnalysisResult {
    /// Assemble a result. The total line count is derived from `lines`.
    #[must_use]
    pub const fn new(
        original: RgbImage,
        enhanced: GrayImage,
        direction: DirectionMap,
        lines: Vec<LineCandidate>,
        hand: Option<HandRegion>,
        grid: Option<PalmGrid>,
    ) -> Self {
        Self {
            original,
            enhanced,
            direction,
            lines,
            hand,
            grid,
        }
    }

    /// The decoded input image.
    #[must_use]
    pub const fn original(&self) -> &RgbImage {
        &self.original
    }

    /// The ridge-enhanced single-channel image lines were detected in.
    #[must_use]
    pub const fn enhanced(&self) -> &GrayImage {
        &self.enhanced
    }

    /// Gradient direction map of the preprocessed image.
    #[must_use]
    pub const fn direction(&self) -> &DirectionMap {
        &self.direction
    }

    /// Final deduplicated, classified lines.
    #[must_use]
    pub fn lines(&self) -> &[LineCandidate] {
        &self.lines
    }

    /// The detected hand, if any.
    #[must_use]
    pub const fn hand(&self) -> Option<&HandRegion> {
        self.hand.as_ref()
    }

    /// The hand mask, if a hand was detected.
    #[must_use]
    pub fn hand_mask(&self) -> Option<&GrayImage> {
        self.hand.as_ref().map(|h| &h.mask)
    }

    /// The palm grid, if a hand was detected.
    #[must_use]
    pub const fn grid(&self) -> Option<&PalmGrid> {
        self.grid.as_ref()
    }

    /// Number of final lines.
    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.lines.len()
    }

    /// Dimensions of the analysed image.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.original.width(),
            height: self.original.height(),
        }
    }
}

// ───────────────────────── Errors ────────────────────────────────────

/// Hard failures of the analysis pipeline.
///
/// Soft conditions (no hand, no lines) are not errors; they show up as
/// `None` / empty fields of [`AnalysisResult`].
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The decoded image has no pixels.
    #[error("image has zero size ({width}x{height})")]
    EmptyImage {
        /// Decoded width.
        width: u32,
        /// Decoded height.
        height: u32,
    },

    /// Analysis configuration is invalid.
    #[error("invalid analysis configuration: {0}")]
    InvalidConfig(String),
}

/// Serde-compatible proxy for `AnalysisError`.
#[derive(Serialize, Deserialize)]
enum AnalysisErrorProxy {
    ImageDecode(String),
    EmptyInput,
    EmptyImage { width: u32, height: u32 },
    InvalidConfig(String),
}

impl Serialize for AnalysisError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => AnalysisErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => AnalysisErrorProxy::EmptyInput,
            Self::EmptyImage { width, height } => AnalysisErrorProxy::EmptyImage {
                width: *width,
                height: *height,
            },
            Self::InvalidConfig(s) => AnalysisErrorProxy::InvalidConfig(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AnalysisError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = AnalysisErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            // The typed image error cannot be rebuilt; keep its message.
            AnalysisErrorProxy::ImageDecode(msg) => {
                Self::ImageDecode(image::ImageError::Decoding(
                    image::error::DecodingError::from_format_hint(
                        image::error::ImageFormatHint::Name(msg),
                    ),
                ))
            }
            AnalysisErrorProxy::EmptyInput => Self::EmptyInput,
            AnalysisErrorProxy::EmptyImage { width, height } => Self::EmptyImage { width, height },
            AnalysisErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- LineSegment ---

    #[test]
    fn segment_length_is_euclidean() {
        let s = LineSegment::new(0, 0, 3, 4);
        assert!((s.length() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn segment_angle_folds_into_upper_half() {
        // Pointing up-left: atan2(-10, -10) = -135 deg, folded to 135.
        let s = LineSegment::new(10, 10, 0, 0);
        assert!((s.angle_degrees() - 135.0).abs() < 1e-9);
        let v = LineSegment::new(5, 100, 5, 0);
        assert!((v.angle_degrees() - 90.0).abs() < 1e-9);
        let h = LineSegment::new(100, 5, 0, 5);
        assert!((h.angle_degrees() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn segment_midpoint() {
        let s = LineSegment::new(0, 0, 5, 10);
        assert_eq!(s.midpoint(), (2.5, 5.0));
    }

    // --- LineClass ---

    #[test]
    fn classification_boundaries() {
        assert_eq!(LineClass::from_geometry(100.0, 90.0), LineClass::MajorVertical);
        assert_eq!(LineClass::from_geometry(100.0, 70.0), LineClass::MajorHorizontal);
        assert_eq!(LineClass::from_geometry(100.0, 110.0), LineClass::MajorHorizontal);
        assert_eq!(LineClass::from_geometry(100.0, 10.0), LineClass::MajorHorizontal);
        assert_eq!(LineClass::from_geometry(80.0, 90.0), LineClass::Medium);
        assert_eq!(LineClass::from_geometry(40.5, 0.0), LineClass::Medium);
        assert_eq!(LineClass::from_geometry(40.0, 90.0), LineClass::Minor);
        assert_eq!(LineClass::from_geometry(20.0, 90.0), LineClass::Minor);
    }

    #[test]
    fn candidate_class_matches_reclassification() {
        let segments = [
            LineSegment::new(0, 0, 0, 100),
            LineSegment::new(0, 0, 90, 5),
            LineSegment::new(10, 10, 10, 60),
            LineSegment::new(3, 3, 28, 3),
        ];
        for s in segments {
            let c = LineCandidate::new(s);
            assert_eq!(c.class(), LineClass::from_geometry(c.length(), c.angle()));
        }
    }

    #[test]
    fn line_class_wire_names() {
        let json = serde_json::to_string(&LineClass::MajorVertical).unwrap();
        assert_eq!(json, "\"major_vertical\"");
        for class in LineClass::ALL {
            assert_eq!(
                serde_json::to_string(&class).unwrap(),
                format!("\"{}\"", class.as_str()),
            );
        }
    }

    // --- HandContour ---

    #[test]
    fn bounding_box_is_inclusive() {
        let c = HandContour::new(vec![
            ContourPoint::new(10, 20),
            ContourPoint::new(13, 20),
            ContourPoint::new(13, 27),
        ]);
        assert_eq!(
            c.bounding_box(),
            Some(BoundingBox {
                x: 10,
                y: 20,
                width: 4,
                height: 8,
            }),
        );
    }

    #[test]
    fn empty_contour_has_no_bounding_box() {
        assert!(HandContour::new(vec![]).bounding_box().is_none());
    }

    // --- AnalysisConfig ---

    #[test]
    fn config_defaults_match_reference_detector() {
        let config = AnalysisConfig::default();
        assert!((config.clahe_clip_limit - 2.0).abs() < f32::EPSILON);
        assert_eq!(config.clahe_tile_grid, 8);
        assert_eq!(config.skin_lower, [0, 20, 70]);
        assert_eq!(config.skin_upper, [20, 255, 255]);
        assert_eq!(config.cleanup_radius, 2);
        assert!((config.canny_low - 30.0).abs() < f32::EPSILON);
        assert!((config.canny_high - 100.0).abs() < f32::EPSILON);
        assert_eq!(config.hough_threshold, 20);
        assert_eq!(config.hough_min_length, 30);
        assert_eq!(config.hough_max_gap, 10);
        assert!((config.cluster_eps - 30.0).abs() < f64::EPSILON);
        assert_eq!(config.cluster_min_samples, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_rejects_inverted_canny_thresholds() {
        let config = AnalysisConfig {
            canny_low: 120.0,
            canny_high: 100.0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_rejects_oversized_clahe_grid() {
        let at_limit = AnalysisConfig {
            clahe_tile_grid: AnalysisConfig::MAX_CLAHE_TILE_GRID,
            ..AnalysisConfig::default()
        };
        assert!(at_limit.validate().is_ok());

        let config = AnalysisConfig {
            clahe_tile_grid: 70_000,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidConfig(_))
        ));
    }

    #[test]
    fn config_rejects_non_finite_canny_high() {
        for canny_high in [f32::NAN, f32::INFINITY] {
            let config = AnalysisConfig {
                canny_high,
                ..AnalysisConfig::default()
            };
            assert!(config.validate().is_err(), "{canny_high} accepted");
        }
    }

    #[test]
    fn config_rejects_inverted_skin_range() {
        let config = AnalysisConfig {
            skin_lower: [30, 20, 70],
            skin_upper: [20, 255, 255],
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_partial_json_fills_defaults() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"canny_low": 10.0}"#).unwrap();
        assert!((config.canny_low - 10.0).abs() < f32::EPSILON);
        assert_eq!(config.hough_threshold, 20);
    }

    // --- AnalysisError ---

    #[test]
    fn error_display() {
        assert_eq!(
            AnalysisError::EmptyInput.to_string(),
            "input image data is empty"
        );
        assert_eq!(
            AnalysisError::EmptyImage {
                width: 0,
                height: 3
            }
            .to_string(),
            "image has zero size (0x3)",
        );
    }

    #[test]
    fn error_serde_keeps_variant() {
        let json = serde_json::to_string(&AnalysisError::InvalidConfig("bad".into())).unwrap();
        let back: AnalysisError = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, AnalysisError::InvalidConfig(ref s) if s == "bad"));
    }
}
