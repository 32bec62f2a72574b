use crate::config::AnalysisConfig;

/// Round seconds to millisecond precision.
pub fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}

/// Time in the source video of an analyzed frame, rounded to milliseconds.
pub fn frame_to_seconds(frame: usize, config: &AnalysisConfig) -> f64 {
    round_millis(frame as f64 * config.fps_factor as f64 / config.fps)
}

/// Nearest analyzed frame for a time in the source video.
pub fn seconds_to_frame(seconds: f64, config: &AnalysisConfig) -> usize {
    (seconds * config.sample_rate()).round().max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunParams;

    fn config(fps: f64, fps_factor: u32) -> AnalysisConfig {
        let params = RunParams {
            fps_factor,
            ..RunParams::default()
        };
        AnalysisConfig::new(fps, params).unwrap()
    }

    #[test]
    fn round_trip_at_30_fps() {
        let config = config(30.0, 1);
        let seconds = frame_to_seconds(90, &config);
        assert_eq!(seconds, 3.0);
        assert_eq!(seconds_to_frame(seconds, &config), 90);
    }

    #[test]
    fn fps_factor_scales_time() {
        let config = config(30.0, 3);
        assert_eq!(frame_to_seconds(10, &config), 1.0);
        assert_eq!(seconds_to_frame(1.0, &config), 10);
    }

    #[test]
    fn rounds_to_milliseconds() {
        let config = config(29.97, 1);
        // 100 / 29.97 = 3.33667
        assert_eq!(frame_to_seconds(100, &config), 3.337);
        assert_eq!(round_millis(1.23449), 1.234);
    }

    #[test]
    fn conversion_is_monotonic() {
        let config = config(23.976, 2);
        let times: Vec<f64> = (0..500).map(|f| frame_to_seconds(f, &config)).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }
}
