//! Analysis diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation intended for
//! parameter tuning. [`analyze_with_diagnostics`](crate::analyze_with_diagnostics)
//! collects them alongside the analysis result.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single analysis run.
///
/// The grid stage only runs when a hand was found, so its field is
/// `None` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDiagnostics {
    /// Luminance, CLAHE, and smoothing.
    pub preprocess: StageDiagnostics,
    /// Skin mask, cleanup, and largest contour.
    pub segmentation: StageDiagnostics,
    /// Ridge enhancement and hand masking.
    pub enhancement: StageDiagnostics,
    /// Canny plus edge closing.
    pub edge_detection: StageDiagnostics,
    /// Probabilistic Hough segment detection.
    pub segment_detection: StageDiagnostics,
    /// Length/angle filter and classification.
    pub line_filter: StageDiagnostics,
    /// DBSCAN deduplication.
    pub clustering: StageDiagnostics,
    /// Palm grid partition (only when a hand was found).
    pub grid: Option<StageDiagnostics>,
    /// Total wall-clock duration of the whole analysis (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: AnalysisSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Preprocessing metrics.
    Preprocess {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// CLAHE clip limit.
        clahe_clip_limit: f32,
        /// CLAHE tiles per side.
        clahe_tile_grid: u32,
    },
    /// Hand segmentation metrics.
    Segmentation {
        /// Whether a hand region was found.
        hand_found: bool,
        /// Pixels inside the filled hand mask.
        hand_pixel_count: u64,
        /// Points on the hand contour.
        contour_point_count: usize,
    },
    /// Ridge enhancement metrics.
    Enhancement {
        /// Non-zero pixels in the enhanced image.
        nonzero_pixel_count: u64,
        /// Whether the hand mask was applied.
        masked: bool,
    },
    /// Edge detection metrics.
    EdgeDetection {
        /// Low threshold (after clamping).
        low_threshold: f32,
        /// High threshold (after clamping).
        high_threshold: f32,
        /// Number of edge pixels after closing.
        edge_pixel_count: u64,
        /// Total pixel count for computing edge density.
        total_pixel_count: u64,
    },
    /// Hough segment detection metrics.
    SegmentDetection {
        /// Accumulator vote threshold.
        threshold: u32,
        /// Minimum segment length.
        min_line_length: u32,
        /// Maximum gap bridged along a segment.
        max_line_gap: u32,
        /// Raw segments found.
        segment_count: usize,
    },
    /// Geometric filter metrics.
    LineFilter {
        /// Segments entering the filter.
        input: usize,
        /// Candidates surviving it.
        kept: usize,
    },
    /// Clustering metrics.
    Clustering {
        /// Candidates entering clustering.
        input: usize,
        /// Lines after deduplication.
        output: usize,
        /// Neighbourhood radius.
        eps: f64,
        /// Minimum neighbourhood size of a core point.
        min_samples: usize,
    },
    /// Grid partition metrics.
    Grid {
        /// Width of each cell.
        cell_width: i32,
        /// Height of each cell.
        cell_height: i32,
    },
}

/// High-level summary counts for the whole analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Whether a hand region was found.
    pub hand_found: bool,
    /// Final line count.
    pub total_lines: usize,
    /// Final lines of a major class.
    pub major_lines: usize,
}

impl AnalysisDiagnostics {
    /// Stages in execution order, with display names.
    fn stages(&self) -> Vec<(&'static str, &StageDiagnostics)> {
        let mut stages = vec![
            ("Preprocess", &self.preprocess),
            ("Segmentation", &self.segmentation),
            ("Enhancement", &self.enhancement),
            ("Edge Detection", &self.edge_detection),
            ("Segment Detection", &self.segment_detection),
            ("Line Filter", &self.line_filter),
            ("Clustering", &self.clustering),
        ];
        if let Some(ref grid) = self.grid {
            stages.push(("Grid", grid));
        }
        stages
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Analysis Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Hand: {}  |  Lines: {} ({} major)",
            if self.summary.hand_found { "found" } else { "none" },
            self.summary.total_lines,
            self.summary.major_lines,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Preprocess {
            width,
            height,
            clahe_clip_limit,
            clahe_tile_grid,
        } => format!(
            "{width}x{height} clahe={clahe_clip_limit:.1}/{clahe_tile_grid}x{clahe_tile_grid}"
        ),
        StageMetrics::Segmentation {
            hand_found: false, ..
        } => "no hand".to_string(),
        StageMetrics::Segmentation {
            hand_pixel_count,
            contour_point_count,
            ..
        } => format!("mask={hand_pixel_count}px contour={contour_point_count}pts"),
        StageMetrics::Enhancement {
            nonzero_pixel_count,
            masked,
        } => {
            let scope = if *masked { "masked" } else { "full frame" };
            format!("nonzero={nonzero_pixel_count} ({scope})")
        }
        StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            edge_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!(
                "low={low_threshold:.1} high={high_threshold:.1} \
                 edges={edge_pixel_count} ({density:.1}%)",
            )
        }
        StageMetrics::SegmentDetection {
            threshold,
            min_line_length,
            max_line_gap,
            segment_count,
        } => format!(
            "votes>={threshold} len>={min_line_length} gap<={max_line_gap} segments={segment_count}"
        ),
        StageMetrics::LineFilter { input, kept } => format!("{input} -> {kept} kept"),
        StageMetrics::Clustering {
            input,
            output,
            eps,
            min_samples,
        } => format!("{input} -> {output} (eps={eps:.1} min={min_samples})"),
        StageMetrics::Grid {
            cell_width,
            cell_height,
        } => format!("cells {cell_width}x{cell_height}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stage(ms: u64, metrics: StageMetrics) -> StageDiagnostics {
        StageDiagnostics {
            duration: Duration::from_millis(ms),
            metrics,
        }
    }

    fn sample(grid: bool) -> AnalysisDiagnostics {
        AnalysisDiagnostics {
            preprocess: stage(
                10,
                StageMetrics::Preprocess {
                    width: 100,
                    height: 80,
                    clahe_clip_limit: 2.0,
                    clahe_tile_grid: 8,
                },
            ),
            segmentation: stage(
                5,
                StageMetrics::Segmentation {
                    hand_found: grid,
                    hand_pixel_count: 4000,
                    contour_point_count: 120,
                },
            ),
            enhancement: stage(
                8,
                StageMetrics::Enhancement {
                    nonzero_pixel_count: 900,
                    masked: grid,
                },
            ),
            edge_detection: stage(
                12,
                StageMetrics::EdgeDetection {
                    low_threshold: 30.0,
                    high_threshold: 100.0,
                    edge_pixel_count: 400,
                    total_pixel_count: 8000,
                },
            ),
            segment_detection: stage(
                20,
                StageMetrics::SegmentDetection {
                    threshold: 50,
                    min_line_length: 30,
                    max_line_gap: 20,
                    segment_count: 14,
                },
            ),
            line_filter: stage(1, StageMetrics::LineFilter { input: 14, kept: 9 }),
            clustering: stage(
                2,
                StageMetrics::Clustering {
                    input: 9,
                    output: 5,
                    eps: 30.0,
                    min_samples: 2,
                },
            ),
            grid: grid.then(|| {
                stage(
                    1,
                    StageMetrics::Grid {
                        cell_width: 20,
                        cell_height: 15,
                    },
                )
            }),
            total_duration: Duration::from_millis(59),
            summary: AnalysisSummary {
                image_width: 100,
                image_height: 80,
                pixel_count: 8000,
                hand_found: grid,
                total_lines: 5,
                major_lines: 2,
            },
        }
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        let ms = duration_ms(d);
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn report_lists_every_stage() {
        let report = sample(true).report();
        assert!(report.contains("Analysis Diagnostics Report"));
        for name in [
            "Preprocess",
            "Segmentation",
            "Enhancement",
            "Edge Detection",
            "Segment Detection",
            "Line Filter",
            "Clustering",
            "Grid",
        ] {
            assert!(report.contains(name), "missing {name}");
        }
        assert!(report.contains("14 -> 9 kept"));
        assert!(report.contains("Lines: 5 (2 major)"));
    }

    #[test]
    fn segment_detection_detail_shows_inclusive_vote_threshold() {
        let report = sample(true).report();
        assert!(report.contains("votes>=50 len>=30 gap<=20 segments=14"));
    }

    #[test]
    fn report_without_hand_skips_grid() {
        let report = sample(false).report();
        assert!(report.contains("no hand"));
        assert!(!report.contains("cells "));
        assert!(report.contains("Hand: none"));
    }

    #[test]
    fn zero_total_duration_does_not_divide() {
        let mut diag = sample(true);
        diag.total_duration = Duration::ZERO;
        assert!(diag.report().contains("0.0%"));
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let json = serde_json::to_value(sample(true)).unwrap();
        let total = json["total_duration"].as_f64().unwrap();
        assert!((total - 0.059).abs() < 1e-9);
        let back: AnalysisDiagnostics = serde_json::from_value(json).unwrap();
        assert!((back.total_duration.as_secs_f64() - 0.059).abs() < 1e-6);
        assert!(back.grid.is_some());
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut json = serde_json::to_value(sample(false)).unwrap();
        json["total_duration"] = serde_json::json!(-1.0);
        assert!(serde_json::from_value::<AnalysisDiagnostics>(json).is_err());
    }
}
