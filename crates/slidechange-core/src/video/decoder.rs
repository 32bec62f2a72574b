use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

use anyhow::{bail, Context, Result};
use image::RgbImage;
use tracing::{debug, error, info};

use super::frame::Frame;
use super::probe::probe_dimensions;

/// Decodes video frames by piping raw RGB24 data from the ffmpeg CLI,
/// resampled to a fixed output rate.
pub struct VideoDecoder {
    child: Child,
    stderr: Option<JoinHandle<String>>,
    width: u32,
    height: u32,
    sample_rate: f64,
    frame_count: u32,
    frame_bytes: usize,
}

impl VideoDecoder {
    /// Open a video file, emitting `sample_rate` frames per second of source time.
    pub fn open(path: &Path, sample_rate: f64) -> Result<Self> {
        if !path.exists() {
            bail!("video file does not exist: {}", path.display());
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            bail!("invalid sample rate: {sample_rate}");
        }

        let (width, height) = probe_dimensions(path)?;

        info!(?path, sample_rate, "spawning ffmpeg decoder process");

        let rate = sample_rate.to_string();
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-i"])
            .arg(path)
            .args(["-r", rate.as_str()])
            .args([
                "-f", "rawvideo",
                "-pix_fmt", "rgb24",
                "-v", "error",
                "pipe:1",
            ]);

        Self::spawn(cmd, width, height, sample_rate)
    }

    /// Start `cmd`, which must write raw RGB24 frames of `width`x`height` to stdout.
    fn spawn(mut cmd: Command, width: u32, height: u32, sample_rate: f64) -> Result<Self> {
        let mut child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("failed to spawn ffmpeg, is ffmpeg installed?")?;

        // Drained on its own thread so a chatty decoder never blocks on a full pipe.
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                String::from_utf8_lossy(&buf).trim().to_string()
            })
        });

        let frame_bytes = (width as usize) * (height as usize) * 3;

        info!(width, height, sample_rate, frame_bytes, "video decoder opened");

        Ok(Self {
            child,
            stderr,
            width,
            height,
            sample_rate,
            frame_count: 0,
            frame_bytes,
        })
    }

    /// Number of frames decoded so far.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Read the next frame from the ffmpeg pipe, or `None` if the video is finished.
    ///
    /// Fails if ffmpeg exits unsuccessfully, even after some frames were read.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        let stdout = self
            .child
            .stdout
            .as_mut()
            .context("ffmpeg stdout not available")?;

        let mut buf = vec![0u8; self.frame_bytes];
        let mut read = 0;

        while read < self.frame_bytes {
            match stdout.read(&mut buf[read..]) {
                Ok(0) => {
                    self.finish()?;
                    if read == 0 {
                        info!(total_frames = self.frame_count, "video stream ended");
                        return Ok(None);
                    }
                    error!(
                        read_bytes = read,
                        expected_bytes = self.frame_bytes,
                        frame = self.frame_count,
                        "ffmpeg stream ended mid-frame"
                    );
                    bail!(
                        "ffmpeg stream ended mid-frame (read {read}/{} bytes)",
                        self.frame_bytes,
                    );
                }
                Ok(n) => read += n,
                Err(e) => {
                    error!(frame = self.frame_count, %e, "failed to read from ffmpeg pipe");
                    return Err(e).context("failed to read from ffmpeg pipe");
                }
            }
        }

        let image = RgbImage::from_raw(self.width, self.height, buf)
            .context("failed to create RgbImage from raw frame data")?;

        let frame_number = self.frame_count;
        let timestamp_seconds = frame_number as f64 / self.sample_rate;
        self.frame_count += 1;

        debug!(frame_number, timestamp_seconds, "decoded frame");

        Ok(Some(Frame {
            image,
            frame_number,
            timestamp_seconds,
        }))
    }

    /// Reap ffmpeg once its stdout is exhausted and turn a failed exit into an error.
    fn finish(&mut self) -> Result<()> {
        let status = self.child.wait().context("failed to wait for ffmpeg")?;
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            error!(%status, %stderr, frame = self.frame_count, "ffmpeg failed while decoding");
            if stderr.is_empty() {
                bail!("ffmpeg failed to decode video ({status})");
            }
            bail!("ffmpeg failed to decode video ({status}): {stderr}");
        }
        Ok(())
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        info!(total_frames = self.frame_count, "closing video decoder");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
