//! JSON response payloads.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use palmline_pipeline::{AnalysisResult, Dimensions, LineClass};

use crate::ReportError;
use crate::encode::{self, OutputFormat};
use crate::summary::LineSummary;

/// Width and height of the analysed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl From<Dimensions> for ImageSize {
    fn from(d: Dimensions) -> Self {
        Self {
            width: d.width,
            height: d.height,
        }
    }
}

/// Successful analysis payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Always `true`.
    pub success: bool,
    /// Base64 of the annotated image.
    pub processed_image: String,
    /// Final line count.
    pub total_lines: usize,
    /// Vertical plus horizontal major lines.
    pub major_lines: usize,
    /// Medium lines.
    pub medium_lines: usize,
    /// Minor lines.
    pub minor_lines: usize,
    /// Distinct classes present, in first-appearance order.
    pub line_types: Vec<LineClass>,
    /// Wall-clock seconds, rounded to two decimals.
    pub processing_time: f64,
    /// Size of the analysed image.
    pub image_size: ImageSize,
}

impl AnalysisReport {
    /// Render, encode, and summarize `result`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Encode`] if the annotated image cannot be
    /// encoded.
    pub fn from_result(
        result: &AnalysisResult,
        elapsed: Duration,
        format: OutputFormat,
    ) -> Result<Self, ReportError> {
        let annotated = palmline_pipeline::render(result);
        let processed_image = encode::encode_base64(&annotated, format)?;
        let summary = LineSummary::from_lines(result.lines());
        Ok(Self {
            success: true,
            processed_image,
            total_lines: result.total_lines(),
            major_lines: summary.major_lines(),
            medium_lines: summary.medium,
            minor_lines: summary.minor,
            line_types: summary.line_types,
            processing_time: round_seconds(elapsed),
            image_size: result.dimensions().into(),
        })
    }
}

/// Failed analysis payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    /// Always `false`.
    pub success: bool,
    /// Human-readable reason.
    pub message: String,
}

impl FailureReport {
    /// Payload carrying `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl From<&ReportError> for FailureReport {
    fn from(err: &ReportError) -> Self {
        Self::new(err.to_string())
    }
}

/// Either payload, serialized without a wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// Analysis succeeded.
    Success(AnalysisReport),
    /// Analysis was rejected or failed.
    Failure(FailureReport),
}

impl From<Result<AnalysisReport, ReportError>> for Response {
    fn from(outcome: Result<AnalysisReport, ReportError>) -> Self {
        match outcome {
            Ok(report) => Self::Success(report),
            Err(err) => Self::Failure(FailureReport::from(&err)),
        }
    }
}

/// Seconds rounded to two decimals.
#[must_use]
pub fn round_seconds(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100.0).round() / 100.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn seconds_round_to_hundredths() {
        assert!((round_seconds(Duration::from_millis(1234)) - 1.23).abs() < 1e-12);
        assert!((round_seconds(Duration::from_millis(1236)) - 1.24).abs() < 1e-12);
        assert!(round_seconds(Duration::ZERO).abs() < f64::EPSILON);
    }

    #[test]
    fn failure_payload_shape() {
        let json = serde_json::to_value(Response::from(Err(ReportError::MissingFilename))).unwrap();
        assert_eq!(json["success"], serde_json::json!(false));
        assert!(json["message"].as_str().unwrap().contains("filename"));
        assert_eq!(json.as_object().unwrap().len(), 2);
    }

    #[test]
    fn success_payload_field_names() {
        let report = AnalysisReport {
            success: true,
            processed_image: "AAAA".to_string(),
            total_lines: 3,
            major_lines: 1,
            medium_lines: 1,
            minor_lines: 1,
            line_types: vec![LineClass::MajorVertical, LineClass::Medium, LineClass::Minor],
            processing_time: 0.42,
            image_size: ImageSize {
                width: 640,
                height: 480,
            },
        };
        let json = serde_json::to_value(Response::Success(report)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "processed_image": "AAAA",
                "total_lines": 3,
                "major_lines": 1,
                "medium_lines": 1,
                "minor_lines": 1,
                "line_types": ["major_vertical", "medium", "minor"],
                "processing_time": 0.42,
                "image_size": { "width": 640, "height": 480 },
            })
        );
    }
}
