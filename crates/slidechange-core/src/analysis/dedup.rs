use std::collections::BTreeSet;
use std::fmt;

use crate::analysis::timing::frame_to_seconds;
use crate::config::AnalysisConfig;

/// Shown instead of a time for peaks whose start frame was already reported.
pub const DUPLICATE_PLACEHOLDER: &str = "-";

/// One peak and the start frame it backtracked to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub peak_frame: usize,
    pub start_frame: usize,
    /// Start time in seconds, or None when an earlier peak already reported
    /// the same start frame.
    pub start_seconds: Option<f64>,
}

impl Detection {
    pub fn is_duplicate(&self) -> bool {
        self.start_seconds.is_none()
    }
}

/// Formats the start time, or the duplicate placeholder.
pub struct StartTimeLabel<'a>(pub &'a Detection);

impl fmt::Display for StartTimeLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.start_seconds {
            Some(seconds) => f.pad(&format!("{seconds:.3}")),
            None => f.pad(DUPLICATE_PLACEHOLDER),
        }
    }
}

/// Start frames collapsed to a distinct set, plus the per-peak trace.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Deduplicated {
    /// One entry per peak, in peak order.
    pub detections: Vec<Detection>,
    /// Distinct start frames, ascending.
    pub starts: Vec<usize>,
}

/// Collapse start frames that several peaks backtracked to.
///
/// `peaks` and `starts` are parallel, in peak order. The first peak to reach
/// a start frame carries its time; later ones carry None.
///
/// # Panics
///
/// Panics if `peaks` and `starts` differ in length.
pub fn deduplicate(peaks: &[usize], starts: &[usize], config: &AnalysisConfig) -> Deduplicated {
    assert_eq!(peaks.len(), starts.len(), "one start frame per peak");

    let mut seen = BTreeSet::new();
    let detections = peaks
        .iter()
        .zip(starts)
        .map(|(&peak_frame, &start_frame)| Detection {
            peak_frame,
            start_frame,
            start_seconds: seen
                .insert(start_frame)
                .then(|| frame_to_seconds(start_frame, config)),
        })
        .collect();

    Deduplicated {
        detections,
        starts: seen.into_iter().collect(),
    }
}
