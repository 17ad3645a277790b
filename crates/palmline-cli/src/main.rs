//! palmline: command-line palm line analysis.
//!
//! Runs the analysis pipeline on an image file with configurable
//! parameters. By default prints a per-class line count; optionally
//! writes the annotated image, prints the JSON report a web client
//! would receive, or prints per-stage diagnostics for tuning.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin palmline -- [OPTIONS] <IMAGE_PATH>
//! ```
//!
//! Logging goes to stderr and honours `RUST_LOG` (default `info`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use palmline_pipeline::{AnalysisConfig, AnalysisDiagnostics, AnalysisResult, LineClass};
use palmline_report::{AnalysisReport, LineSummary, OutputFormat, ReportError};
use tracing_subscriber::EnvFilter;

/// Palm line extraction and classification.
///
/// Finds the principal creases in a photograph of an open palm,
/// classifies them by length and orientation, and overlays a 4×4 grid
/// on the hand.
#[derive(Parser)]
#[command(name = "palmline", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, GIF, BMP).
    image_path: PathBuf,

    /// CLAHE clip limit.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_CLAHE_CLIP_LIMIT)]
    clahe_clip_limit: f32,

    /// CLAHE tiles per side.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_CLAHE_TILE_GRID)]
    clahe_tile_grid: u32,

    /// Lower HSV skin bound as `h,s,v` (H in 0..180).
    #[arg(long, value_delimiter = ',', default_values_t = AnalysisConfig::DEFAULT_SKIN_LOWER)]
    skin_lower: Vec<u8>,

    /// Upper HSV skin bound as `h,s,v`.
    #[arg(long, value_delimiter = ',', default_values_t = AnalysisConfig::DEFAULT_SKIN_UPPER)]
    skin_upper: Vec<u8>,

    /// Radius of the skin mask cleanup element.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_CLEANUP_RADIUS)]
    cleanup_radius: u8,

    /// Canny low threshold.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_CANNY_LOW)]
    canny_low: f32,

    /// Canny high threshold.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_CANNY_HIGH)]
    canny_high: f32,

    /// Minimum Hough accumulator votes.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_HOUGH_THRESHOLD)]
    hough_threshold: u32,

    /// Minimum Hough segment length in pixels.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_HOUGH_MIN_LENGTH)]
    hough_min_length: u32,

    /// Maximum gap bridged within a Hough segment.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_HOUGH_MAX_GAP)]
    hough_max_gap: u32,

    /// DBSCAN radius over (mid x, mid y, angle).
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_CLUSTER_EPS)]
    cluster_eps: f64,

    /// DBSCAN minimum neighbourhood size.
    #[arg(long, default_value_t = AnalysisConfig::DEFAULT_CLUSTER_MIN_SAMPLES)]
    cluster_min_samples: usize,

    /// Full analysis config as a JSON string.
    ///
    /// When provided, all other analysis parameter flags are ignored.
    /// Missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Write the annotated image to this file.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Encoding of the annotated image (also used inside `--json`).
    #[arg(long, value_enum, default_value_t = Format::Jpeg)]
    format: Format,

    /// Print the JSON report instead of the line count table.
    #[arg(long)]
    json: bool,

    /// Print per-stage diagnostics (as JSON when combined with `--json`).
    #[arg(long)]
    diagnostics: bool,

    /// Fail when no lines are found.
    #[arg(long)]
    require_lines: bool,

    /// Number of runs for averaging diagnostics.
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    runs: usize,
}

/// Annotated image encoding.
#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// JPEG, quality 95.
    Jpeg,
    /// Lossless PNG.
    Png,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Jpeg => Self::Jpeg,
            Format::Png => Self::Png,
        }
    }
}

/// Build an [`AnalysisConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<AnalysisConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        AnalysisConfig {
            clahe_clip_limit: cli.clahe_clip_limit,
            clahe_tile_grid: cli.clahe_tile_grid,
            skin_lower: hsv_triple("--skin-lower", &cli.skin_lower)?,
            skin_upper: hsv_triple("--skin-upper", &cli.skin_upper)?,
            cleanup_radius: cli.cleanup_radius,
            canny_low: cli.canny_low,
            canny_high: cli.canny_high,
            hough_threshold: cli.hough_threshold,
            hough_min_length: cli.hough_min_length,
            hough_max_gap: cli.hough_max_gap,
            cluster_eps: cli.cluster_eps,
            cluster_min_samples: cli.cluster_min_samples,
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn hsv_triple(flag: &str, values: &[u8]) -> Result<[u8; 3], String> {
    values
        .try_into()
        .map_err(|_| format!("{flag} takes exactly three values, got {}", values.len()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = config_from_cli(cli)?;

    let image_bytes = std::fs::read(&cli.image_path)
        .map_err(|e| format!("Error reading {}: {e}", cli.image_path.display()))?;
    let filename = cli.image_path.file_name().and_then(|s| s.to_str());
    palmline_report::validate_upload(filename, &image_bytes).map_err(|e| e.to_string())?;

    tracing::info!(
        path = %cli.image_path.display(),
        bytes = image_bytes.len(),
        runs = cli.runs,
        "analysing"
    );
    tracing::debug!(?config, "analysis config");

    let mut all_diagnostics = Vec::with_capacity(cli.runs);
    for run_index in 0..cli.runs {
        let start = Instant::now();
        let image = palmline_pipeline::grayscale::decode_rgb(&image_bytes)
            .map_err(|e| format!("Analysis error: {e}"))?;
        let (result, diagnostics) = palmline_pipeline::analyze_with_diagnostics(image, &config)
            .map_err(|e| format!("Analysis error: {e}"))?;

        // Outputs come from the first run only.
        if run_index == 0 {
            if cli.require_lines && result.total_lines() == 0 {
                return Err(ReportError::NoLines.to_string());
            }
            emit_outputs(cli, &result, start.elapsed())?;
        }

        if cli.diagnostics {
            if cli.runs > 1 {
                eprintln!("--- Run {}/{} ---", run_index + 1, cli.runs);
            }
            if cli.json {
                let json = serde_json::to_string_pretty(&diagnostics)
                    .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
                println!("{json}");
            } else {
                println!("{}", diagnostics.report());
            }
        }
        all_diagnostics.push(diagnostics);
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }
    Ok(())
}

/// Annotated image file, JSON report, or line count table.
fn emit_outputs(cli: &Cli, result: &AnalysisResult, elapsed: Duration) -> Result<(), String> {
    let format = OutputFormat::from(cli.format);

    if let Some(ref path) = cli.output {
        write_annotated(path, result, format)?;
    }

    if cli.json {
        let report =
            AnalysisReport::from_result(result, elapsed, format).map_err(|e| e.to_string())?;
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("Error serializing report: {e}"))?;
        println!("{json}");
    } else if !cli.diagnostics {
        print_line_table(result);
    }
    Ok(())
}

fn write_annotated(
    path: &Path,
    result: &AnalysisResult,
    format: OutputFormat,
) -> Result<(), String> {
    let annotated = palmline_pipeline::render(result);
    let bytes = palmline_report::encode_image(&annotated, format).map_err(|e| e.to_string())?;
    std::fs::write(path, &bytes)
        .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "annotated image written");
    Ok(())
}

fn print_line_table(result: &AnalysisResult) {
    let summary = LineSummary::from_lines(result.lines());
    let dims = result.dimensions();
    println!("Image: {}x{}", dims.width, dims.height);
    println!(
        "Hand: {}",
        if result.hand().is_some() { "found" } else { "not found" }
    );
    println!();
    println!("{:<20} {:>6}", "Class", "Lines");
    println!("{}", "-".repeat(27));
    for class in LineClass::ALL {
        println!("{:<20} {:>6}", class.as_str(), summary.count(class));
    }
    println!("{}", "-".repeat(27));
    println!("{:<20} {:>6}", "total", result.total_lines());
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&AnalysisDiagnostics) -> Option<Duration>;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[AnalysisDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Preprocess", |d| Some(d.preprocess.duration)),
        ("Segmentation", |d| Some(d.segmentation.duration)),
        ("Enhancement", |d| Some(d.enhancement.duration)),
        ("Edge Detection", |d| Some(d.edge_detection.duration)),
        ("Segment Detection", |d| Some(d.segment_detection.duration)),
        ("Line Filter", |d| Some(d.line_filter.duration)),
        ("Clustering", |d| Some(d.clustering.duration)),
        ("Grid", |d| d.grid.as_ref().map(|s| s.duration)),
    ];

    for (name, extractor) in stage_extractors {
        let stage_durations: Vec<f64> = all_diagnostics
            .iter()
            .filter_map(extractor)
            .map(|dur| dur.as_secs_f64() * 1000.0)
            .collect();

        if stage_durations.is_empty() {
            continue;
        }

        let stage_mean = stage_durations.iter().sum::<f64>() / stage_durations.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
