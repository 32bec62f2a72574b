use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::RgbImage;
use tracing::{info, warn};

use crate::analysis::dedup::Detection;
use crate::analysis::diff::{compute_diff, DiffSeries};
use crate::analysis::peaks::{LocalMaxima, PeakDetector};
use crate::analysis::{detect_changes, ChangeDetection};
use crate::config::{AnalysisConfig, RunParams};
use crate::debug::DebugRenderer;
use crate::report::ChangeReport;
use crate::validate::{parse_proposed_times, validate};
use crate::video::decoder::VideoDecoder;
use crate::video::frame::Frame;
use crate::video::probe::{ensure_tools_available, resolve_frame_rate};

/// Log decoding progress every this many frames.
const PROGRESS_INTERVAL: u32 = 25;

/// Parameters for the analysis pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub params: RunParams,
    /// Pipe-delimited proposed change times to validate against, in seconds.
    pub proposed_times: Option<String>,
    /// Directory to write annotated change start frames, or None to skip.
    pub debug_frames_dir: Option<PathBuf>,
    /// Font for debug frame annotations.
    pub font: Option<PathBuf>,
}

/// Run the full analysis on a video file.
///
/// Fails before decoding anything if the proposed times do not parse, the
/// ffmpeg tools are missing, or the frame rate cannot be determined.
pub fn run_pipeline(input: &Path, config: &PipelineConfig) -> Result<ChangeReport> {
    if !input.exists() {
        bail!("input video does not exist: {}", input.display());
    }

    let proposed = config
        .proposed_times
        .as_deref()
        .map(parse_proposed_times)
        .transpose()
        .context("invalid validation times")?;

    ensure_tools_available()?;
    let fps = resolve_frame_rate(input).context("cannot analyze video without a frame rate")?;
    let analysis = AnalysisConfig::new(fps, config.params)?;

    info!(
        ?input,
        fps,
        fps_factor = analysis.fps_factor,
        pixel_stride = analysis.pixel_stride,
        tolerance = analysis.validation_tolerance,
        min_peak_height = analysis.min_peak_height,
        "pipeline starting"
    );

    let (series, frame_count) = collect_diffs(input, &analysis)?;
    info!(frame_count, "frame collection complete");

    let report = build_report(
        input.to_path_buf(),
        &analysis,
        &series,
        frame_count,
        proposed.as_deref(),
        &LocalMaxima,
    );

    if let Some(dir) = &config.debug_frames_dir {
        save_debug_frames(input, &analysis, &report.detection, dir, config.font.as_deref())?;
    }

    info!(
        peak_count = report.detection.peaks.len(),
        change_count = report.start_times().len(),
        passed = ?report.passed(),
        "pipeline complete"
    );
    Ok(report)
}

/// Analyze frames that are already decoded, e.g. by another decoder.
pub fn analyze_frames(
    source: PathBuf,
    frames: &[RgbImage],
    config: &AnalysisConfig,
    proposed: Option<&[f64]>,
) -> ChangeReport {
    let series = DiffSeries::from_frames(frames, config.pixel_stride);
    build_report(source, config, &series, frames.len(), proposed, &LocalMaxima)
}

fn build_report(
    source: PathBuf,
    config: &AnalysisConfig,
    series: &DiffSeries,
    frame_count: usize,
    proposed: Option<&[f64]>,
    detector: &dyn PeakDetector,
) -> ChangeReport {
    let detection = detect_changes(series, config, detector);
    if detection.start_times.is_empty() {
        warn!(frame_count, "no changes detected");
    }

    let validation =
        proposed.map(|times| validate(&detection.start_times, times, config.validation_tolerance));

    ChangeReport {
        source,
        config: *config,
        frame_count,
        diffs: series.records().to_vec(),
        detection,
        validation,
    }
}

/// Decode the video once, keeping only the previous frame in memory.
fn collect_diffs(input: &Path, config: &AnalysisConfig) -> Result<(DiffSeries, usize)> {
    let mut decoder =
        VideoDecoder::open(input, config.sample_rate()).context("failed to open video")?;
    let mut series = DiffSeries::new();
    let mut prev: Option<Frame> = None;

    while let Some(frame) = decoder.next_frame()? {
        if let Some(prev) = &prev {
            series.push(compute_diff(&prev.image, &frame.image, config.pixel_stride));
        }
        if frame.frame_number % PROGRESS_INTERVAL == 0 {
            info!(frame_number = frame.frame_number, "reading frames");
        }
        prev = Some(frame);
    }

    Ok((series, decoder.frame_count() as usize))
}

/// Decode the video again and save every distinct change start frame.
fn save_debug_frames(
    input: &Path,
    config: &AnalysisConfig,
    detection: &ChangeDetection,
    dir: &Path,
    font: Option<&Path>,
) -> Result<()> {
    let mut by_start: BTreeMap<usize, Vec<&Detection>> = BTreeMap::new();
    for d in &detection.detections {
        by_start.entry(d.start_frame).or_default().push(d);
    }
    let Some(&last_start) = by_start.keys().next_back() else {
        info!("no change start frames to save");
        return Ok(());
    };

    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create debug frames directory {}", dir.display()))?;
    info!(?dir, frames = by_start.len(), "debug frames directory ready");

    let renderer = DebugRenderer::new(font);
    let mut decoder =
        VideoDecoder::open(input, config.sample_rate()).context("failed to reopen video")?;

    while let Some(frame) = decoder.next_frame()? {
        let index = frame.frame_number as usize;
        if let Some(detections) = by_start.get(&index) {
            renderer
                .save_start_frame(&frame, detections, dir)
                .context("failed to save debug frame")?;
        }
        if index >= last_start {
            break;
        }
    }

    Ok(())
}
