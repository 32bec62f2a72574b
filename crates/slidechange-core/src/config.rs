use crate::error::ConfigError;

/// Per-channel absolute difference (0-255) a sample must exceed to count as change.
pub const NOISE_FLOOR: u8 = 8;

/// Number of trailing `subset_avg_change` values averaged by the smoother.
pub const SMOOTHING_WINDOW: usize = 5;

pub const DEFAULT_MIN_PEAK_HEIGHT: f64 = 4.0;
pub const DEFAULT_PIXEL_STRIDE: usize = 25;
pub const DEFAULT_VALIDATION_TOLERANCE: f64 = 0.25;

/// User-controlled parameters of a run. The frame rate comes from the video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunParams {
    /// Analyze every Nth frame of the source.
    pub fps_factor: u32,
    /// Compare every Nth pixel of the flattened frame.
    pub pixel_stride: usize,
    /// Seconds; both the validation window and the minimum peak spacing.
    pub validation_tolerance: f64,
    /// Smoothed change a peak must reach to be reported.
    pub min_peak_height: f64,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            fps_factor: 1,
            pixel_stride: DEFAULT_PIXEL_STRIDE,
            validation_tolerance: DEFAULT_VALIDATION_TOLERANCE,
            min_peak_height: DEFAULT_MIN_PEAK_HEIGHT,
        }
    }
}

/// Immutable parameters shared by every analysis stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisConfig {
    pub fps: f64,
    pub fps_factor: u32,
    pub pixel_stride: usize,
    pub validation_tolerance: f64,
    pub min_peak_height: f64,
}

impl AnalysisConfig {
    pub fn new(fps: f64, params: RunParams) -> Result<Self, ConfigError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(ConfigError::InvalidFps(fps));
        }
        if params.fps_factor == 0 {
            return Err(ConfigError::ZeroFpsFactor);
        }
        if params.pixel_stride == 0 {
            return Err(ConfigError::ZeroPixelStride);
        }
        if !params.validation_tolerance.is_finite() || params.validation_tolerance <= 0.0 {
            return Err(ConfigError::InvalidTolerance(params.validation_tolerance));
        }
        if !params.min_peak_height.is_finite() {
            return Err(ConfigError::InvalidPeakHeight(params.min_peak_height));
        }

        Ok(Self {
            fps,
            fps_factor: params.fps_factor,
            pixel_stride: params.pixel_stride,
            validation_tolerance: params.validation_tolerance,
            min_peak_height: params.min_peak_height,
        })
    }

    /// Rate (frames per second) at which frames are extracted for analysis.
    pub fn sample_rate(&self) -> f64 {
        self.fps / self.fps_factor as f64
    }

    /// Minimum spacing between peaks, in analyzed frames.
    pub fn min_peak_distance(&self) -> usize {
        (self.sample_rate() * self.validation_tolerance).round() as usize
    }
}
