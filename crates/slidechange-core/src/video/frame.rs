use image::RgbImage;

/// A single decoded frame of the resampled stream.
#[derive(Debug)]
pub struct Frame {
    /// The frame's pixels.
    pub image: RgbImage,
    /// Index among analyzed frames (0-based, after fps_factor subsampling).
    pub frame_number: u32,
    /// Elapsed seconds from the start of the source.
    pub timestamp_seconds: f64,
}
