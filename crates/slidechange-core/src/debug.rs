use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::{debug, info, warn};

use crate::analysis::dedup::Detection;
use crate::video::frame::Frame;

const TEXT_SCALE: f32 = 28.0;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const TEXT_LINE_HEIGHT: i32 = 30;
const TEXT_PANEL_WIDTH: u32 = 360;
const BORDER_COLOR: Rgb<u8> = Rgb([255, 64, 64]);
const BORDER_WIDTH: u32 = 4;

/// Saves the frames where detected changes start, annotated with the peaks
/// that backtracked to them.
pub struct DebugRenderer {
    font: Option<FontVec>,
}

impl DebugRenderer {
    /// Without a usable font, frames are still saved with the border only.
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = font_path.and_then(Self::load_font);
        Self { font }
    }

    /// Write `start_{frame:08}.png` into `dir` and return its path.
    ///
    /// `detections` are the detections whose start frame is this frame.
    pub fn save_start_frame(
        &self,
        frame: &Frame,
        detections: &[&Detection],
        dir: &Path,
    ) -> Result<PathBuf> {
        let mut img = frame.image.clone();

        for inset in 0..BORDER_WIDTH {
            let (w, h) = (img.width(), img.height());
            if w <= inset * 2 || h <= inset * 2 {
                break;
            }
            let rect = Rect::at(inset as i32, inset as i32).of_size(w - inset * 2, h - inset * 2);
            draw_hollow_rect_mut(&mut img, rect, BORDER_COLOR);
        }

        self.draw_text_overlay(&mut img, frame, detections);

        let path = dir.join(format!("start_{:08}.png", frame.frame_number));
        img.save(&path)
            .with_context(|| format!("failed to save debug frame to {}", path.display()))?;

        debug!(?path, "saved debug frame");
        Ok(path)
    }

    fn draw_text_overlay(&self, img: &mut RgbImage, frame: &Frame, detections: &[&Detection]) {
        let Some(font) = &self.font else { return };
        let scale = PxScale::from(TEXT_SCALE);

        let mut lines = vec![
            format!("F:{}", frame.frame_number),
            format!("T:{:.3}s", frame.timestamp_seconds),
        ];
        let peaks: Vec<String> = detections.iter().map(|d| d.peak_frame.to_string()).collect();
        if !peaks.is_empty() {
            lines.push(format!("Peaks:{}", peaks.join(",")));
        }

        let panel_h = (TEXT_LINE_HEIGHT as u32) * lines.len() as u32 + 10;
        let panel_w = TEXT_PANEL_WIDTH.min(img.width());
        let panel_h = panel_h.min(img.height());
        if panel_w > 0 && panel_h > 0 {
            draw_filled_rect_mut(img, Rect::at(0, 0).of_size(panel_w, panel_h), TEXT_BACKGROUND);
        }

        let x = 10;
        let mut y = 10;
        for line in &lines {
            draw_text_mut(img, TEXT_COLOR, x, y, scale, font, line);
            y += TEXT_LINE_HEIGHT;
        }
    }

    fn load_font(path: &Path) -> Option<FontVec> {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                warn!(?path, error = %e, "failed to read font file");
                return None;
            }
        };
        match FontVec::try_from_vec(data) {
            Ok(font) => {
                info!(?path, "loaded debug font");
                Some(font)
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to parse font file");
                None
            }
        }
    }
}
