use crate::config::SMOOTHING_WINDOW;

/// Trailing mean of `subset_avg_change` over [`SMOOTHING_WINDOW`] frames.
///
/// `subset` is indexed by frame with the index 0 sentinel. Frames that do not
/// yet have a full window of diff records behind them smooth to exactly 0.
pub fn rolling_average(subset: &[f64]) -> Vec<f64> {
    (0..subset.len())
        .map(|i| {
            if i < SMOOTHING_WINDOW {
                0.0
            } else {
                let window = &subset[i + 1 - SMOOTHING_WINDOW..=i];
                window.iter().sum::<f64>() / SMOOTHING_WINDOW as f64
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_is_zero() {
        let subset = [0.0, 50.0, 50.0, 50.0, 50.0, 50.0, 50.0];
        let smoothed = rolling_average(&subset);
        assert_eq!(smoothed.len(), subset.len());
        for (i, value) in smoothed.iter().enumerate().take(SMOOTHING_WINDOW) {
            assert_eq!(*value, 0.0, "frame {i} should be in the cold start");
        }
        assert_eq!(smoothed[5], 50.0);
        assert_eq!(smoothed[6], 50.0);
    }

    #[test]
    fn averages_five_most_recent_values() {
        let subset = [0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 0.0];
        let smoothed = rolling_average(&subset);
        assert_eq!(smoothed[5], 30.0);
        assert_eq!(smoothed[6], 40.0);
        assert_eq!(smoothed[7], 36.0);
    }

    #[test]
    fn short_series() {
        assert!(rolling_average(&[]).is_empty());
        assert_eq!(rolling_average(&[0.0, 9.0, 9.0]), vec![0.0; 3]);
    }
}
