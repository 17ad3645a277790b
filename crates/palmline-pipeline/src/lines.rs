//! Line extractor: edges, segments, geometric filter, classification,
//! and deduplication.

use image::GrayImage;

use crate::cluster;
use crate::edge;
use crate::hough::{self, HoughParams};
use crate::types::{AnalysisConfig, LineCandidate, LineSegment};

/// Segments shorter than this are dropped.
pub const MIN_LENGTH: f64 = 20.0;

/// Whether an angle (degrees, `[0, 180]`) lies in one of the accepted
/// bands: near-vertical `(60, 120)`, or near-horizontal `< 30` / `> 150`.
#[must_use]
pub fn angle_accepted(angle: f64) -> bool {
    (angle > 60.0 && angle < 120.0) || angle < 30.0 || angle > 150.0
}

/// Whether a classified candidate passes the geometric filter.
#[must_use]
pub fn passes_filter(candidate: &LineCandidate) -> bool {
    candidate.length() >= MIN_LENGTH && angle_accepted(candidate.angle())
}

/// Classify raw segments and drop those failing the geometric filter.
/// Survivors keep their input order.
#[must_use]
pub fn filter_and_classify(segments: &[LineSegment]) -> Vec<LineCandidate> {
    segments
        .iter()
        .map(|s| LineCandidate::new(*s))
        .filter(passes_filter)
        .collect()
}

/// Filter, classify, and merge near-duplicates.
#[must_use]
pub fn refine_segments(segments: &[LineSegment], config: &AnalysisConfig) -> Vec<LineCandidate> {
    cluster::merge_similar(
        filter_and_classify(segments),
        config.cluster_eps,
        config.cluster_min_samples,
    )
}

/// Every intermediate of one line extraction.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Closed Canny edge map.
    pub edges: GrayImage,
    /// Raw detected segments.
    pub segments: Vec<LineSegment>,
    /// Candidates surviving the geometric filter.
    pub filtered: Vec<LineCandidate>,
    /// Final deduplicated lines.
    pub lines: Vec<LineCandidate>,
}

/// Run the full extractor on the enhanced ridge image.
#[must_use]
pub fn extract_stages(enhanced: &GrayImage, config: &AnalysisConfig) -> Extraction {
    let edges = edge::detect_edges(enhanced, config.canny_low, config.canny_high);
    let segments = hough::detect_segments(&edges, HoughParams::from_config(config));
    let filtered = filter_and_classify(&segments);
    let lines = cluster::merge_similar(
        filtered.clone(),
        config.cluster_eps,
        config.cluster_min_samples,
    );
    Extraction {
        edges,
        segments,
        filtered,
        lines,
    }
}

/// Final classified lines found in the enhanced ridge image.
#[must_use]
pub fn extract_lines(enhanced: &GrayImage, config: &AnalysisConfig) -> Vec<LineCandidate> {
    extract_stages(enhanced, config).lines
}
