pub mod backtrack;
pub mod dedup;
pub mod diff;
pub mod peaks;
pub mod smooth;
pub mod timing;

use tracing::{debug, info};

use crate::config::AnalysisConfig;

use backtrack::backtrack_start;
use dedup::{deduplicate, Detection};
use diff::DiffSeries;
use peaks::PeakDetector;
use smooth::rolling_average;
use timing::frame_to_seconds;

/// Everything the change detection stages produced for one run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeDetection {
    /// Smoothed `subset_avg_change`, one value per frame.
    pub smoothed: Vec<f64>,
    /// Peak frames, ascending.
    pub peaks: Vec<usize>,
    /// Per-peak trace in peak order, duplicates included.
    pub detections: Vec<Detection>,
    /// Distinct change start frames, ascending.
    pub starts: Vec<usize>,
    /// Times of `starts` in seconds, rounded to milliseconds.
    pub start_times: Vec<f64>,
}

/// Run smoothing, peak detection, backtracking and deduplication over a diff series.
pub fn detect_changes(
    series: &DiffSeries,
    config: &AnalysisConfig,
    detector: &dyn PeakDetector,
) -> ChangeDetection {
    let subset = series.subset_avg_changes();
    let smoothed = rolling_average(subset);

    let min_distance = config.min_peak_distance();
    let peaks = detector.detect(&smoothed, config.min_peak_height, min_distance);
    info!(
        frames = series.frame_count(),
        peak_count = peaks.len(),
        min_height = config.min_peak_height,
        min_distance,
        "peak detection complete"
    );

    let starts: Vec<usize> = peaks
        .iter()
        .map(|&peak| {
            let start = backtrack_start(subset, peak);
            debug!(peak, start, "backtracked peak");
            start
        })
        .collect();

    let deduped = deduplicate(&peaks, &starts, config);
    let start_times = deduped
        .starts
        .iter()
        .map(|&start| frame_to_seconds(start, config))
        .collect();

    ChangeDetection {
        smoothed,
        peaks,
        detections: deduped.detections,
        starts: deduped.starts,
        start_times,
    }
}
