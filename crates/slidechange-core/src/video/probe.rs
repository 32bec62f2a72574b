use std::path::Path;
use std::process::{Command, Output, Stdio};

use anyhow::{bail, Context, Result};
use tracing::{debug, error, info, warn};

use crate::error::ProbeError;

/// Rates closer than this are treated as the same rate.
const RATE_EPSILON: f64 = 1e-6;

fn run_tool(tool: &'static str, args: &[&str], path: Option<&Path>) -> Result<Output, ProbeError> {
    let mut cmd = Command::new(tool);
    cmd.args(args);
    if let Some(path) = path {
        cmd.arg(path);
    }
    let output = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|source| ProbeError::ToolUnavailable { tool, source })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        error!(tool, %stderr, "external tool failed");
        return Err(ProbeError::ToolFailed {
            tool,
            status: output.status,
            stderr,
        });
    }
    Ok(output)
}

/// Check that `ffmpeg` and `ffprobe` can be run.
pub fn ensure_tools_available() -> Result<(), ProbeError> {
    for tool in ["ffmpeg", "ffprobe"] {
        run_tool(tool, &["-version"], None)?;
        info!(tool, "verified external tool is installed");
    }
    Ok(())
}

/// Determine the frame rate of a video from ffprobe's report of its video streams.
pub fn resolve_frame_rate(path: &Path) -> Result<f64, ProbeError> {
    info!(?path, "probing frame rate with ffprobe");

    let output = run_tool(
        "ffprobe",
        &[
            "-v", "error",
            "-select_streams", "v",
            "-show_entries", "stream=r_frame_rate:stream_disposition=attached_pic",
            "-of", "csv=p=0",
        ],
        Some(path),
    )?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let fps = select_frame_rate(&stdout, path)?;
    info!(fps, "frame rate resolved");
    Ok(fps)
}

/// Pick the single frame rate out of ffprobe's per-stream output.
///
/// Each non-empty line holds one stream's rate as `num/den` or a decimal,
/// optionally followed by its `attached_pic` disposition flag. Cover art
/// streams (flag `1`) and streams reporting `0/0` carry no rate and are skipped.
pub fn select_frame_rate(stdout: &str, path: &Path) -> Result<f64, ProbeError> {
    let mut rates: Vec<f64> = Vec::new();

    for line in stdout.lines() {
        let mut fields = line.trim().split(',').map(str::trim);
        let field = fields.next().unwrap_or_default();
        if field.is_empty() {
            continue;
        }
        if fields.next() == Some("1") {
            debug!(field, "skipping attached picture stream");
            continue;
        }
        let rate = parse_rate(field).ok_or_else(|| ProbeError::MalformedRate(field.to_string()))?;
        if rate <= 0.0 {
            warn!(field, "stream reports no usable frame rate");
            continue;
        }
        if !rates.iter().any(|r| (r - rate).abs() < RATE_EPSILON) {
            rates.push(rate);
        }
    }

    match rates.as_slice() {
        [] => {
            error!(?path, "could not extract fps");
            Err(ProbeError::RateUnavailable {
                path: path.to_path_buf(),
            })
        }
        [rate] => Ok(*rate),
        _ => {
            error!(?path, ?rates, "multiple fps found");
            Err(ProbeError::RateAmbiguous {
                path: path.to_path_buf(),
                rates,
            })
        }
    }
}

/// Parse `num/den` or a plain decimal. A zero denominator yields 0.
fn parse_rate(field: &str) -> Option<f64> {
    let rate = if let Some((num, den)) = field.split_once('/') {
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        if den > 0.0 {
            num / den
        } else {
            0.0
        }
    } else {
        field.parse().ok()?
    };
    rate.is_finite().then_some(rate)
}

/// Width and height of the first video stream.
pub fn probe_dimensions(path: &Path) -> Result<(u32, u32)> {
    let output = run_tool(
        "ffprobe",
        &[
            "-v", "error",
            "-select_streams", "v:0",
            "-show_entries", "stream=width,height",
            "-of", "csv=p=0",
        ],
        Some(path),
    )?;

    // Output format: "width,height"
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parts: Vec<&str> = stdout.trim().split(',').collect();
    if parts.len() < 2 {
        error!(%stdout, "unexpected ffprobe output format, expected width,height");
        bail!("unexpected ffprobe output: {stdout}");
    }

    let width: u32 = parts[0].trim().parse().context("failed to parse width")?;
    let height: u32 = parts[1].trim().parse().context("failed to parse height")?;
    if width == 0 || height == 0 {
        bail!("invalid video dimensions: {width}x{height}");
    }

    info!(width, height, "probe completed");
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    fn video() -> &'static Path {
        Path::new("talk.mp4")
    }

    #[test]
    fn single_fractional_rate() {
        let fps = select_frame_rate("30000/1001\n", video()).unwrap();
        assert!((fps - 29.97).abs() < 0.001);
    }

    #[test]
    fn decimal_rate_and_repeated_streams() {
        let fps = select_frame_rate("25\n50/2\n", video()).unwrap();
        assert_eq!(fps, 25.0);
    }

    #[test]
    #[traced_test]
    fn streams_without_rate_are_skipped() {
        let fps = select_frame_rate("0/0\n24/1\n", video()).unwrap();
        assert_eq!(fps, 24.0);
        assert!(logs_contain("no usable frame rate"));
    }

    #[test]
    fn missing_rate_is_unavailable() {
        let err = select_frame_rate("", video()).unwrap_err();
        assert!(matches!(err, ProbeError::RateUnavailable { .. }));

        let err = select_frame_rate("0/0\n", video()).unwrap_err();
        assert!(matches!(err, ProbeError::RateUnavailable { .. }));
    }

    #[test]
    fn conflicting_rates_are_ambiguous() {
        let err = select_frame_rate("30/1\n60/1\n", video()).unwrap_err();
        match err {
            ProbeError::RateAmbiguous { rates, .. } => assert_eq!(rates, vec![30.0, 60.0]),
            other => panic!("expected RateAmbiguous, got {other:?}"),
        }
    }

    #[test]
    #[traced_test]
    fn cover_art_stream_is_ignored() {
        let fps = select_frame_rate("30/1,0\n90000/1,1\n", video()).unwrap();
        assert_eq!(fps, 30.0);
        assert!(logs_contain("skipping attached picture stream"));

        let fps = select_frame_rate("90000/1,1\n30000/1001,0\n", video()).unwrap();
        assert!((fps - 29.97).abs() < 0.001);
    }

    #[test]
    fn cover_art_alone_has_no_rate() {
        let err = select_frame_rate("90000/1,1\n", video()).unwrap_err();
        assert!(matches!(err, ProbeError::RateUnavailable { .. }));
    }

    #[test]
    fn conflicting_real_streams_stay_ambiguous() {
        let err = select_frame_rate("30/1,0\n60/1,0\n90000/1,1\n", video()).unwrap_err();
        match err {
            ProbeError::RateAmbiguous { rates, .. } => assert_eq!(rates, vec![30.0, 60.0]),
            other => panic!("expected RateAmbiguous, got {other:?}"),
        }
    }

    #[test]
    fn garbage_rate_is_malformed() {
        let err = select_frame_rate("thirty\n", video()).unwrap_err();
        assert!(matches!(err, ProbeError::MalformedRate(s) if s == "thirty"));
    }
}
