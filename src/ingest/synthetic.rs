//! Synthetic capture source.
//!
//! Generates a dark background with a bright "subject" blob that drifts
//! across the scene, plus per-pixel noise. Bright-on-dark is exactly what the
//! luminance landmark backend looks for, so the full pipeline exercises end
//! to end on synthetic input.

use anyhow::Result;
use rand::Rng;
use std::time::{Duration, Instant};

use crate::config::CameraSettings;
use crate::frame::{Frame, PIXEL_BYTES};
use crate::ingest::Capture;

pub struct SyntheticCapture {
    settings: CameraSettings,
    frame_count: u64,
    last_capture: Option<Instant>,
}

impl SyntheticCapture {
    pub fn new(settings: CameraSettings) -> Self {
        log::info!(
            "synthetic capture: {} ({}x{} @ {} fps)",
            settings.device,
            settings.width,
            settings.height,
            settings.target_fps
        );
        Self {
            settings,
            frame_count: 0,
            last_capture: None,
        }
    }

    /// Sleep long enough to approximate the configured frame rate. A real
    /// device paces the caller the same way.
    fn pace(&mut self) {
        if self.settings.target_fps == 0 {
            return;
        }
        let interval = Duration::from_secs(1) / self.settings.target_fps;
        if let Some(last) = self.last_capture {
            let elapsed = last.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
        }
        self.last_capture = Some(Instant::now());
    }

    fn generate_pixels(&mut self) -> Vec<u8> {
        let width = self.settings.width;
        let height = self.settings.height;
        let mut rng = rand::thread_rng();

        // Subject drifts horizontally, bouncing off the edges.
        let period = 200u64;
        let phase = (self.frame_count % period) as f32 / period as f32;
        let sweep = if phase < 0.5 {
            phase * 2.0
        } else {
            2.0 - phase * 2.0
        };
        let cx = (0.2 + 0.6 * sweep) * width as f32;
        let cy = 0.4 * height as f32;
        let radius = (width.min(height) as f32) * 0.12;

        let mut pixels = vec![0u8; width as usize * height as usize * PIXEL_BYTES];
        for y in 0..height {
            for x in 0..width {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let inside = dx * dx + dy * dy <= radius * radius;
                let base: [u8; 3] = if inside {
                    [220, 205, 190]
                } else {
                    [24, 28, 32]
                };
                let noise: i16 = rng.gen_range(-8..=8);
                let idx = (y as usize * width as usize + x as usize) * PIXEL_BYTES;
                for (offset, &channel) in base.iter().enumerate() {
                    pixels[idx + offset] = (channel as i16 + noise).clamp(0, 255) as u8;
                }
            }
        }
        pixels
    }
}

impl Capture for SyntheticCapture {
    fn next_frame(&mut self) -> Result<Frame> {
        self.pace();
        self.frame_count += 1;
        let pixels = self.generate_pixels();
        Frame::new(pixels, self.settings.width, self.settings.height)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
