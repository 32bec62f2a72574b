use std::path::PathBuf;

use thiserror::Error;

/// Failures while asking ffmpeg/ffprobe about a video.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run {tool}, is ffmpeg installed?")]
    ToolUnavailable {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("could not determine the frame rate of {}", path.display())]
    RateUnavailable { path: PathBuf },

    #[error("multiple frame rates reported for {}: {rates:?}", path.display())]
    RateAmbiguous { path: PathBuf, rates: Vec<f64> },

    #[error("unparseable frame rate {0:?} in ffprobe output")]
    MalformedRate(String),
}

/// Rejected run parameters.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("fps must be a positive number, got {0}")]
    InvalidFps(f64),

    #[error("fps_factor must be >= 1")]
    ZeroFpsFactor,

    #[error("pixel_stride must be >= 1")]
    ZeroPixelStride,

    #[error("validation tolerance must be a positive number of seconds, got {0}")]
    InvalidTolerance(f64),

    #[error("minimum peak height must be finite, got {0}")]
    InvalidPeakHeight(f64),
}

/// Problems with the proposed validation times string.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("invalid proposed time {0:?}, expected seconds like 1.25")]
    InvalidTime(String),

    #[error("no proposed times given")]
    NoTimes,
}

/// Problems with a frame grab time offset.
#[derive(Debug, Error, PartialEq)]
pub enum TimestampError {
    #[error("empty time offset")]
    Empty,

    #[error("invalid time offset {0:?}, expected SS, MM:SS or HH:MM:SS.xxx")]
    Invalid(String),
}
