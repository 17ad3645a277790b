//! palmline-report: Upload handling and response payloads (sans-IO).
//!
//! Wraps [`palmline_pipeline`] for request/response callers: validates
//! an uploaded file, runs the analysis, renders and encodes the
//! annotated image, and builds the JSON payload with per-class counts.

pub mod encode;
pub mod response;
pub mod summary;
pub mod upload;

use std::time::Instant;

use palmline_pipeline::{AnalysisConfig, AnalysisError};

pub use encode::{OutputFormat, encode_base64, encode_image};
pub use response::{AnalysisReport, FailureReport, ImageSize, Response};
pub use summary::LineSummary;
pub use upload::{ALLOWED_EXTENSIONS, MAX_UPLOAD_BYTES, validate_upload};

/// Errors that can occur while turning an upload into a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// No filename was supplied.
    #[error("no filename was supplied")]
    MissingFilename,

    /// The filename extension is not accepted.
    #[error("unsupported file type {0:?} (expected png, jpg, jpeg, gif, or bmp)")]
    UnsupportedExtension(String),

    /// The uploaded payload is empty.
    #[error("uploaded file is empty")]
    EmptyUpload,

    /// The uploaded payload exceeds the size limit.
    #[error("file is too large: {size} bytes (limit {limit} bytes)")]
    TooLarge {
        /// Payload size.
        size: usize,
        /// Maximum accepted size.
        limit: usize,
    },

    /// The analysis itself failed.
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// The annotated image could not be encoded.
    #[error("failed to encode annotated image: {0}")]
    Encode(#[from] image::ImageError),

    /// No lines were found and the caller asked to reject that outcome.
    #[error("no palm lines found; use a photo where the palm is clearly visible")]
    NoLines,
}

/// Caller policy for [`analyze_upload`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportOptions {
    /// Encoding of the annotated image.
    pub format: OutputFormat,
    /// Treat a result with zero lines as [`ReportError::NoLines`].
    pub reject_empty: bool,
}

/// Validate an upload, analyse it, and build the success payload.
///
/// `processing_time` covers everything from decoding to encoding.
///
/// # Errors
///
/// Returns the validation errors of [`validate_upload`],
/// [`ReportError::Analysis`] if decoding or analysis fails,
/// [`ReportError::NoLines`] when `options.reject_empty` is set and
/// nothing was found, and [`ReportError::Encode`] if encoding fails.
pub fn analyze_upload(
    filename: Option<&str>,
    bytes: &[u8],
    config: &AnalysisConfig,
    options: ReportOptions,
) -> Result<AnalysisReport, ReportError> {
    let start = Instant::now();
    validate_upload(filename, bytes)?;

    let result = palmline_pipeline::analyze_bytes(bytes, config)?;
    if options.reject_empty && result.total_lines() == 0 {
        tracing::warn!(filename, "rejecting result with no lines");
        return Err(ReportError::NoLines);
    }

    let report = AnalysisReport::from_result(&result, start.elapsed(), options.format)?;
    tracing::debug!(
        total_lines = report.total_lines,
        major_lines = report.major_lines,
        encoded_len = report.processed_image.len(),
        "report built"
    );
    Ok(report)
}

/// [`analyze_upload`] folded into a payload that is always serializable.
#[must_use]
pub fn respond(
    filename: Option<&str>,
    bytes: &[u8],
    config: &AnalysisConfig,
    options: ReportOptions,
) -> Response {
    let outcome = analyze_upload(filename, bytes, config, options);
    if let Err(ref err) = outcome {
        tracing::warn!(%err, "analysis request failed");
    }
    Response::from(outcome)
}
