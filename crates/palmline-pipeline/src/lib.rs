//! palmline-pipeline: Pure palm line analysis pipeline (sans-IO).
//!
//! Finds the principal creases of a palm photograph through:
//! preprocess -> hand segmentation -> ridge enhancement -> Canny ->
//! probabilistic Hough -> filter/classify -> DBSCAN deduplication,
//! plus a 4×4 grid over the hand's bounding box.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! buffers and byte slices and returns structured data. File handling
//! and response encoding live in `palmline-cli` and `palmline-report`.

pub mod blur;
pub mod canny;
pub mod cluster;
pub mod contour;
pub mod contrast;
pub mod diagnostics;
pub mod edge;
pub mod enhance;
pub mod grayscale;
pub mod grid;
pub mod hough;
pub mod lines;
pub mod preprocess;
pub mod render;
pub mod segment;
pub mod types;

use std::time::{Duration, Instant};

use image::RgbImage;

pub use diagnostics::{AnalysisDiagnostics, AnalysisSummary, StageDiagnostics, StageMetrics};
pub use render::render;
pub use types::{
    AnalysisConfig, AnalysisError, AnalysisResult, BoundingBox, ContourPoint, Dimensions,
    DirectionMap, GridRegion, HandContour, HandRegion, LineCandidate, LineClass, LineSegment,
    PalmGrid,
};

/// Analyse a decoded colour image.
///
/// # Pipeline steps
///
/// 1. Preprocess (luminance, CLAHE, 5×5 Gaussian)
/// 2. Segment the hand from the original colours
/// 3. Enhance ridges, masked to the hand when one was found
/// 4. Extract lines: Canny, Hough segments, filter/classify, DBSCAN
/// 5. Partition the hand's bounding box into a 4×4 grid
///
/// A missing hand and an empty line list are valid outcomes, not errors.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidConfig`] if `config` fails validation.
/// Returns [`AnalysisError::EmptyImage`] if `image` has no pixels.
pub fn analyze(image: RgbImage, config: &AnalysisConfig) -> Result<AnalysisResult, AnalysisError> {
    analyze_with_diagnostics(image, config).map(|(result, _)| result)
}

/// Decode raw image bytes (PNG, JPEG, BMP, GIF, WebP) and analyse them.
///
/// # Errors
///
/// Returns [`AnalysisError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`AnalysisError::ImageDecode`] if the image format is unrecognized.
/// Otherwise as [`analyze`].
pub fn analyze_bytes(
    image_bytes: &[u8],
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    let image = grayscale::decode_rgb(image_bytes)?;
    analyze(image, config)
}

/// Run [`analyze`] while timing every stage.
///
/// # Errors
///
/// Same as [`analyze`].
pub fn analyze_with_diagnostics(
    image: RgbImage,
    config: &AnalysisConfig,
) -> Result<(AnalysisResult, AnalysisDiagnostics), AnalysisError> {
    config.validate()?;
    grayscale::ensure_non_empty(&image)?;
    let dimensions = Dimensions {
        width: image.width(),
        height: image.height(),
    };
    let total_start = Instant::now();

    // 1. Preprocess.
    let (smoothed, preprocess) = instrumented(|| {
        let smoothed = preprocess::preprocess(&image, config);
        let metrics = StageMetrics::Preprocess {
            width: dimensions.width,
            height: dimensions.height,
            clahe_clip_limit: config.clahe_clip_limit,
            clahe_tile_grid: config.clahe_tile_grid,
        };
        (smoothed, metrics)
    });
    tracing::debug!(
        width = dimensions.width,
        height = dimensions.height,
        "preprocessed"
    );

    // 2. Hand segmentation.
    let (hand, segmentation) = instrumented(|| {
        let hand = segment::segment_hand(&image, config);
        let metrics = StageMetrics::Segmentation {
            hand_found: hand.is_some(),
            hand_pixel_count: hand.as_ref().map_or(0, |h| edge::count_nonzero(&h.mask)),
            contour_point_count: hand.as_ref().map_or(0, |h| h.contour.len()),
        };
        (hand, metrics)
    });
    match &hand {
        Some(h) => tracing::debug!(contour_points = h.contour.len(), "hand segmented"),
        None => tracing::warn!("no hand region found; analysing the full frame"),
    }

    // 3. Ridge enhancement.
    let (enhanced, enhancement) = instrumented(|| {
        let mask = hand.as_ref().map(|h| &h.mask);
        let enhanced = enhance::enhance(&smoothed, mask);
        let metrics = StageMetrics::Enhancement {
            nonzero_pixel_count: edge::count_nonzero(&enhanced.ridges),
            masked: mask.is_some(),
        };
        (enhanced, metrics)
    });
    tracing::debug!("ridges enhanced");

    // 4a. Edge map.
    let (edges, edge_detection) = instrumented(|| {
        let (low, high) = edge::clamp_thresholds(config.canny_low, config.canny_high);
        let edges = edge::detect_edges(&enhanced.ridges, low, high);
        let metrics = StageMetrics::EdgeDetection {
            low_threshold: low,
            high_threshold: high,
            edge_pixel_count: edge::count_nonzero(&edges),
            total_pixel_count: dimensions.pixel_count(),
        };
        (edges, metrics)
    });
    tracing::debug!(edge_pixels = edge::count_nonzero(&edges), "edges detected");

    // 4b. Segment detection.
    let (segments, segment_detection) = instrumented(|| {
        let params = hough::HoughParams::from_config(config);
        let segments = hough::detect_segments(&edges, params);
        let metrics = StageMetrics::SegmentDetection {
            threshold: params.threshold,
            min_line_length: params.min_line_length,
            max_line_gap: params.max_line_gap,
            segment_count: segments.len(),
        };
        (segments, metrics)
    });
    tracing::debug!(count = segments.len(), "segments detected");

    // 4c. Filter and classify.
    let (filtered, line_filter) = instrumented(|| {
        let filtered = lines::filter_and_classify(&segments);
        let metrics = StageMetrics::LineFilter {
            input: segments.len(),
            kept: filtered.len(),
        };
        (filtered, metrics)
    });
    tracing::debug!(kept = filtered.len(), "segments filtered");

    // 4d. Deduplicate.
    let filtered_count = filtered.len();
    let (lines, clustering) = instrumented(|| {
        let lines =
            cluster::merge_similar(filtered, config.cluster_eps, config.cluster_min_samples);
        let metrics = StageMetrics::Clustering {
            input: filtered_count,
            output: lines.len(),
            eps: config.cluster_eps,
            min_samples: config.cluster_min_samples,
        };
        (lines, metrics)
    });
    tracing::debug!(count = lines.len(), "lines clustered");

    // 5. Grid.
    let (grid, grid_duration) = timed(|| grid::partition(hand.as_ref().map(|h| &h.contour)));
    let grid_diag = grid.as_ref().map(|g| StageDiagnostics {
        duration: grid_duration,
        metrics: StageMetrics::Grid {
            cell_width: g.regions[0].width,
            cell_height: g.regions[0].height,
        },
    });

    let total_duration = total_start.elapsed();
    let major_lines = lines.iter().filter(|l| l.class().is_major()).count();
    tracing::info!(
        total_lines = lines.len(),
        major_lines,
        hand_found = hand.is_some(),
        elapsed_ms = total_duration.as_secs_f64() * 1000.0,
        "palm analysis complete"
    );

    let diagnostics = AnalysisDiagnostics {
        preprocess,
        segmentation,
        enhancement,
        edge_detection,
        segment_detection,
        line_filter,
        clustering,
        grid: grid_diag,
        total_duration,
        summary: AnalysisSummary {
            image_width: dimensions.width,
            image_height: dimensions.height,
            pixel_count: dimensions.pixel_count(),
            hand_found: hand.is_some(),
            total_lines: lines.len(),
            major_lines,
        },
    };
    let result = AnalysisResult::new(
        image,
        enhanced.ridges,
        enhanced.direction,
        lines,
        hand,
        grid,
    );
    Ok((result, diagnostics))
}

/// Run `stage`, measuring its wall-clock time.
fn timed<T>(stage: impl FnOnce() -> T) -> (T, Duration) {
    let start = Instant::now();
    let out = stage();
    (out, start.elapsed())
}

/// Run a stage that reports its own metrics.
fn instrumented<T>(stage: impl FnOnce() -> (T, StageMetrics)) -> (T, StageDiagnostics) {
    let ((out, metrics), duration) = timed(stage);
    (out, StageDiagnostics { duration, metrics })
}
