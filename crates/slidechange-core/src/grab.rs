//! Save the frame shown at a given time offset of a video as a PNG.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use tracing::{error, info, warn};

use crate::error::TimestampError;

/// Parse a time offset of the form `SS`, `MM:SS` or `HH:MM:SS`, where the
/// last field may carry a fractional part (`HH:MM:SS.xxx`).
pub fn parse_timestamp(input: &str) -> Result<f64, TimestampError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TimestampError::Empty);
    }
    let invalid = || TimestampError::Invalid(input.to_string());

    let fields: Vec<&str> = input.split(':').collect();
    if fields.len() > 3 {
        return Err(invalid());
    }

    let (whole, last) = fields.split_at(fields.len() - 1);
    let seconds: f64 = last[0].parse().map_err(|_| invalid())?;
    if !seconds.is_finite() || seconds < 0.0 || (!whole.is_empty() && seconds >= 60.0) {
        return Err(invalid());
    }

    let mut total = 0.0;
    for (i, field) in whole.iter().enumerate() {
        let value: u32 = field.parse().map_err(|_| invalid())?;
        // Minutes are bounded when hours precede them.
        if i == 1 && value >= 60 {
            return Err(invalid());
        }
        total = total * 60.0 + value as f64;
    }

    Ok(total * 60.0 + seconds)
}

/// First of `base.ext`, `base-1.ext`, `base-2.ext`, ... that does not exist yet.
pub fn free_file_name(dir: &Path, base: &str, extension: &str) -> PathBuf {
    let mut attempt = dir.join(format!("{base}.{extension}"));
    let mut index = 1;
    while attempt.exists() {
        attempt = dir.join(format!("{base}-{index}.{extension}"));
        index += 1;
    }
    attempt
}

/// Extract the frame at `time` (see [`parse_timestamp`]) into `out_dir`.
///
/// The file is named after the video and the requested time and never
/// overwrites an existing file. Returns the path written.
pub fn grab_frame(input: &Path, time: &str, out_dir: &Path) -> Result<PathBuf> {
    if !input.exists() {
        bail!("input video does not exist: {}", input.display());
    }
    let seconds = parse_timestamp(time)?;

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let video_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    let base = format!("{video_name}.{}", time.trim().replace(':', "."));
    let target = free_file_name(out_dir, &base, "png");

    info!(?input, seconds, ?target, "grabbing frame");

    let offset = format!("{seconds:.3}");
    let output = Command::new("ffmpeg")
        .args(["-ss", offset.as_str(), "-i"])
        .arg(input)
        .args(["-vframes", "1"])
        .arg(&target)
        .args(["-loglevel", "24"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .context("failed to run ffmpeg, is ffmpeg installed?")?;

    let log = String::from_utf8_lossy(&output.stderr);

    if !target.exists() {
        error!(%log, ?target, "ffmpeg did not write a frame");
        if log.contains("Output file is empty, nothing was encoded") {
            bail!("no frame at time {time}, nothing was saved");
        }
        if log.contains("Could not open file") {
            bail!(
                "permission error opening {} or writing to {}",
                input.display(),
                out_dir.display()
            );
        }
        bail!("ffmpeg failed to extract a frame at {time}: {}", log.trim());
    }

    if log.contains("could not seek to position") {
        warn!(time, ?target, "ffmpeg could not seek exactly, frame may not match the time");
    }

    info!(?target, "frame saved");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_time_forms() {
        assert_eq!(parse_timestamp("12"), Ok(12.0));
        assert_eq!(parse_timestamp("2.5"), Ok(2.5));
        assert_eq!(parse_timestamp("1:30"), Ok(90.0));
        assert_eq!(parse_timestamp("01:02:03.250"), Ok(3723.25));
        assert_eq!(parse_timestamp(" 0:00:07 "), Ok(7.0));
        assert_eq!(parse_timestamp("90:00"), Ok(5400.0));
    }

    #[test]
    fn rejects_bad_times() {
        assert_eq!(parse_timestamp(""), Err(TimestampError::Empty));
        for bad in ["abc", "1:2:3:4", "1:60", "1:75:00", "-3", "1:-5", "1.5:00"] {
            assert!(
                matches!(parse_timestamp(bad), Err(TimestampError::Invalid(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn free_file_name_skips_existing() {
        let dir = tempfile::tempdir().unwrap();
        let first = free_file_name(dir.path(), "talk.mp4.1.5", "png");
        assert_eq!(first, dir.path().join("talk.mp4.1.5.png"));

        std::fs::write(&first, b"").unwrap();
        let second = free_file_name(dir.path(), "talk.mp4.1.5", "png");
        assert_eq!(second, dir.path().join("talk.mp4.1.5-1.png"));

        std::fs::write(&second, b"").unwrap();
        let third = free_file_name(dir.path(), "talk.mp4.1.5", "png");
        assert_eq!(third, dir.path().join("talk.mp4.1.5-2.png"));
    }

    #[test]
    fn missing_video_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = grab_frame(&dir.path().join("missing.mp4"), "1", dir.path()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
