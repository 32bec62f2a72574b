use image::RgbImage;
use tracing::{debug, warn};

use crate::config::NOISE_FLOOR;

/// Change statistics between a frame and the frame before it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiffRecord {
    /// Sum of channel differences above the noise floor.
    pub total_change: u64,
    /// Mean channel difference over every sampled value.
    pub avg_change: f64,
    /// Mean channel difference over values above the noise floor, 0 if none were.
    pub subset_avg_change: f64,
}

/// Compare two frames sample by sample.
///
/// Samples every `pixel_stride`-th pixel of the flattened (row-major) pixel
/// sequence, not a 2D grid. Frames of different sizes are compared up to the
/// shorter of the two.
///
/// # Panics
///
/// Panics if `pixel_stride` is 0; [`AnalysisConfig`](crate::config::AnalysisConfig)
/// never holds such a stride.
pub fn compute_diff(prev: &RgbImage, cur: &RgbImage, pixel_stride: usize) -> DiffRecord {
    debug_assert!(pixel_stride > 0, "pixel_stride must be >= 1");

    let prev_raw = prev.as_raw();
    let cur_raw = cur.as_raw();
    if prev_raw.len() != cur_raw.len() {
        warn!(
            prev_len = prev_raw.len() / 3,
            cur_len = cur_raw.len() / 3,
            "frame length mismatch, comparing the overlapping pixels only"
        );
    }

    let mut total_change: u64 = 0;
    let mut sum: u64 = 0;
    let mut count: u64 = 0;
    let mut subset_sum: u64 = 0;
    let mut subset_count: u64 = 0;

    let pairs = prev_raw.chunks_exact(3).zip(cur_raw.chunks_exact(3));
    for (a, b) in pairs.step_by(pixel_stride) {
        for channel in 0..3 {
            let delta = a[channel].abs_diff(b[channel]) as u64;
            if delta > NOISE_FLOOR as u64 {
                total_change += delta;
                subset_sum += delta;
                subset_count += 1;
            }
            sum += delta;
            count += 1;
        }
    }

    DiffRecord {
        total_change,
        avg_change: mean(sum, count),
        subset_avg_change: mean(subset_sum, subset_count),
    }
}

fn mean(sum: u64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Diff records for a run of frames, aligned to the later frame's index.
///
/// Frames are pushed one at a time so only the previous frame has to stay
/// in memory. A series always covers frame 0, which has no record.
#[derive(Debug, Clone)]
pub struct DiffSeries {
    records: Vec<DiffRecord>,
    /// `subset_avg_change` per frame index; index 0 is a 0.0 sentinel.
    subset: Vec<f64>,
}

impl Default for DiffSeries {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffSeries {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            subset: vec![0.0],
        }
    }

    /// Build a series from already decoded frames.
    pub fn from_frames(frames: &[RgbImage], pixel_stride: usize) -> Self {
        let mut series = Self::new();
        for pair in frames.windows(2) {
            series.push(compute_diff(&pair[0], &pair[1], pixel_stride));
        }
        series
    }

    /// Build a series from records for frames `1..=records.len()`.
    pub fn from_records(records: Vec<DiffRecord>) -> Self {
        let mut series = Self::new();
        for record in records {
            series.push(record);
        }
        series
    }

    /// Append the record for the next frame pair.
    pub fn push(&mut self, record: DiffRecord) {
        debug!(
            frame = self.subset.len(),
            total = record.total_change,
            avg = record.avg_change,
            subset_avg = record.subset_avg_change,
            "frame diff"
        );
        self.records.push(record);
        self.subset.push(record.subset_avg_change);
    }

    /// Records for frames `1..frame_count()`, in order.
    pub fn records(&self) -> &[DiffRecord] {
        &self.records
    }

    /// `subset_avg_change` indexed by frame, with 0.0 at index 0.
    pub fn subset_avg_changes(&self) -> &[f64] {
        &self.subset
    }

    /// Number of frames the series covers.
    pub fn frame_count(&self) -> usize {
        self.subset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
