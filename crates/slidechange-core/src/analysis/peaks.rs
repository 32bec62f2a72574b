use tracing::debug;

/// Finds peaks in a smoothed change series.
pub trait PeakDetector {
    /// Return strictly increasing indices of local maxima that reach
    /// `min_height`, no two of them within `min_distance` frames of each other.
    ///
    /// Identical inputs must always produce identical output.
    fn detect(&self, series: &[f64], min_height: f64, min_distance: usize) -> Vec<usize>;
}

/// Local maxima detection in the style of the classic `detect_peaks` routine.
///
/// A peak is a sample higher than its left neighbour and not lower than its
/// right neighbour, so the first sample of a flat top counts. The first and
/// last samples are never peaks. Close peaks are resolved greedily from the
/// tallest down, dropping every other peak within `min_distance` of a kept one.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalMaxima;

impl PeakDetector for LocalMaxima {
    fn detect(&self, series: &[f64], min_height: f64, min_distance: usize) -> Vec<usize> {
        let n = series.len();
        if n < 3 {
            return Vec::new();
        }

        let candidates: Vec<usize> = (1..n - 1)
            .filter(|&i| {
                series[i] - series[i - 1] > 0.0
                    && series[i + 1] - series[i] <= 0.0
                    && series[i] >= min_height
            })
            .collect();

        if min_distance <= 1 || candidates.len() < 2 {
            return candidates;
        }

        // Stable ascending sort, then reversed: among equal heights the later
        // index wins.
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|&a, &b| series[candidates[a]].total_cmp(&series[candidates[b]]));
        order.reverse();

        let mut removed = vec![false; candidates.len()];
        for &keep in &order {
            if removed[keep] {
                continue;
            }
            for (other, &idx) in candidates.iter().enumerate() {
                if other != keep && idx.abs_diff(candidates[keep]) <= min_distance {
                    if !removed[other] {
                        debug!(
                            dropped = idx,
                            kept = candidates[keep],
                            min_distance,
                            "peak suppressed by a taller neighbour"
                        );
                    }
                    removed[other] = true;
                }
            }
        }

        candidates
            .into_iter()
            .zip(removed)
            .filter_map(|(idx, dropped)| (!dropped).then_some(idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic bumpy series without pulling in an RNG.
    fn bumpy_series(len: usize) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let x = i as f64;
                10.0 * (x * 0.7).sin().abs() + 3.0 * (x * 2.3).cos() + (x * 0.05)
            })
            .collect()
    }

    #[test]
    fn finds_simple_maxima() {
        let series = [0.0, 5.0, 1.0, 0.0, 7.0, 2.0, 0.0];
        assert_eq!(LocalMaxima.detect(&series, 4.0, 1), vec![1, 4]);
    }

    #[test]
    fn applies_min_height() {
        let series = [0.0, 3.9, 0.0, 4.0, 0.0, 6.0, 0.0];
        assert_eq!(LocalMaxima.detect(&series, 4.0, 1), vec![3, 5]);
    }

    #[test]
    fn flat_top_reports_first_sample() {
        let series = [0.0, 5.0, 5.0, 5.0, 0.0];
        assert_eq!(LocalMaxima.detect(&series, 1.0, 1), vec![1]);
    }

    #[test]
    fn endpoints_are_never_peaks() {
        let series = [9.0, 1.0, 5.0, 1.0, 9.0];
        assert_eq!(LocalMaxima.detect(&series, 1.0, 1), vec![2]);

        let rising = [0.0, 1.0, 2.0, 3.0];
        assert!(LocalMaxima.detect(&rising, 0.0, 1).is_empty());
        assert!(LocalMaxima.detect(&[1.0, 2.0], 0.0, 1).is_empty());
    }

    #[test]
    fn close_peaks_keep_the_tallest() {
        let series = [0.0, 5.0, 0.0, 8.0, 0.0, 6.0, 0.0, 0.0, 0.0, 0.0, 7.0, 0.0];
        assert_eq!(LocalMaxima.detect(&series, 4.0, 2), vec![3, 10]);
        assert_eq!(LocalMaxima.detect(&series, 4.0, 6), vec![3, 10]);
        // The window is inclusive: 10 - 3 == 7.
        assert_eq!(LocalMaxima.detect(&series, 4.0, 7), vec![3]);
    }

    #[test]
    fn suppressed_peak_does_not_suppress_others() {
        // 6 suppresses 5, which therefore cannot suppress 4.5 in turn.
        let series = [0.0, 0.0, 4.5, 0.0, 5.0, 0.0, 6.0, 0.0];
        assert_eq!(LocalMaxima.detect(&series, 4.0, 2), vec![2, 6]);
    }

    #[test]
    fn detection_is_deterministic_and_spaced() {
        let series = bumpy_series(400);
        for min_distance in [0, 1, 2, 5, 13] {
            let first = LocalMaxima.detect(&series, 4.0, min_distance);
            let second = LocalMaxima.detect(&series, 4.0, min_distance);
            assert_eq!(first, second);
            assert!(!first.is_empty());

            for pair in first.windows(2) {
                assert!(pair[0] < pair[1]);
                assert!(
                    pair[1] - pair[0] >= min_distance,
                    "peaks {pair:?} closer than {min_distance}"
                );
            }
            for &idx in &first {
                assert!(idx >= 1 && idx < series.len() - 1);
                assert!(series[idx] >= 4.0);
            }
        }
    }
}
