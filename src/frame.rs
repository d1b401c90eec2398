//! Frame buffers and region math.
//!
//! - `Frame`: Owned RGB8 pixel buffer with dimensions and a capture timestamp.
//! - `NormalizedRect`: Resolution-independent region in 0..1 coordinates.
//!
//! A `Frame` is immutable after capture from the pipeline's point of view;
//! only the overlay renderer mutates pixels, and it does so on the render
//! loop's private copy. `Clone` is a deep copy. Every handoff across a thread
//! boundary clones, so no holder ever aliases a buffer another thread may
//! overwrite.

use anyhow::{anyhow, Result};
use std::time::Instant;

/// Bytes per pixel (RGB8).
pub const PIXEL_BYTES: usize = 3;

/// Owned RGB8 frame.
#[derive(Clone)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    timestamp: Instant,
}

impl Frame {
    /// Create a frame from raw RGB8 bytes. Length must be `width * height * 3`.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(PIXEL_BYTES))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if data.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            timestamp: Instant::now(),
        })
    }

    /// A black frame, mostly useful in tests and synthetic sources.
    pub fn blank(width: u32, height: u32) -> Result<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(PIXEL_BYTES))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        Self::new(vec![0u8; len], width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Capture instant. Monotonic; carried across clones and derived frames.
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Pixel at (x, y), or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * PIXEL_BYTES;
        Some([self.data[idx], self.data[idx + 1], self.data[idx + 2]])
    }

    /// Write a pixel, ignoring out-of-bounds coordinates.
    pub fn put_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * PIXEL_BYTES;
        self.data[idx..idx + PIXEL_BYTES].copy_from_slice(&rgb);
    }

    /// Nearest-neighbour downscale to `target_width`, preserving aspect ratio.
    ///
    /// Used to derive the cheap working copy that feeds inference; the
    /// full-resolution frame stays untouched for display and cropping.
    pub fn resize_to_width(&self, target_width: u32) -> Result<Frame> {
        if target_width == 0 {
            return Err(anyhow!("target width must be >= 1"));
        }
        let target_height =
            ((self.height as u64 * target_width as u64) / self.width as u64).max(1) as u32;
        let mut out =
            Vec::with_capacity(target_width as usize * target_height as usize * PIXEL_BYTES);
        for y in 0..target_height {
            let src_y = (y as u64 * self.height as u64 / target_height as u64) as u32;
            for x in 0..target_width {
                let src_x = (x as u64 * self.width as u64 / target_width as u64) as u32;
                let idx = (src_y as usize * self.width as usize + src_x as usize) * PIXEL_BYTES;
                out.extend_from_slice(&self.data[idx..idx + PIXEL_BYTES]);
            }
        }
        let mut frame = Frame::new(out, target_width, target_height)?;
        frame.timestamp = self.timestamp;
        Ok(frame)
    }

    /// Crop a normalized region, clamped to the frame bounds.
    ///
    /// Returns `None` when the clamped region is empty (a face box hugging
    /// the frame edge can collapse to zero pixels).
    pub fn crop(&self, region: &NormalizedRect) -> Option<Frame> {
        let (x, y, w, h) = region.to_pixels(self.width, self.height);
        if w == 0 || h == 0 {
            return None;
        }
        let mut out = Vec::with_capacity(w as usize * h as usize * PIXEL_BYTES);
        for row in y..y + h {
            let start = (row as usize * self.width as usize + x as usize) * PIXEL_BYTES;
            let end = start + w as usize * PIXEL_BYTES;
            out.extend_from_slice(&self.data[start..end]);
        }
        let mut frame = Frame::new(out, w, h).ok()?;
        frame.timestamp = self.timestamp;
        Some(frame)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// NormalizedRect
// ----------------------------------------------------------------------------

/// Rectangle in normalized 0..1 coordinates, resolution independent.
///
/// Landmark results are normalized, so a box derived from a downscaled
/// working copy applies directly to the full-resolution frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl NormalizedRect {
    /// Clamp the rectangle into the unit square.
    pub fn clamped(self) -> Self {
        let x = self.x.clamp(0.0, 1.0);
        let y = self.y.clamp(0.0, 1.0);
        Self {
            x,
            y,
            w: self.w.clamp(0.0, 1.0 - x),
            h: self.h.clamp(0.0, 1.0 - y),
        }
    }

    /// Convert to pixel coordinates for a frame of the given size, clamped so
    /// `x + w <= width` and `y + h <= height`.
    pub fn to_pixels(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let r = self.clamped();
        let x = (r.x * width as f32) as u32;
        let y = (r.y * height as f32) as u32;
        let w = ((r.w * width as f32) as u32).min(width.saturating_sub(x));
        let h = ((r.h * height as f32) as u32).min(height.saturating_sub(y));
        (x, y, w, h)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height) as usize * PIXEL_BYTES);
        for y in 0..height {
            for x in 0..width {
                let v = ((x + y) % 256) as u8;
                data.extend_from_slice(&[v, v, v]);
            }
        }
        Frame::new(data, width, height).unwrap()
    }

    #[test]
    fn rejects_wrong_buffer_length() {
        assert!(Frame::new(vec![0u8; 10], 4, 4).is_err());
    }

    #[test]
    fn resize_preserves_aspect_ratio() -> Result<()> {
        let frame = gradient_frame(800, 600);
        let small = frame.resize_to_width(320)?;
        assert_eq!(small.width(), 320);
        assert_eq!(small.height(), 240);
        assert_eq!(small.pixels().len(), 320 * 240 * PIXEL_BYTES);
        Ok(())
    }

    #[test]
    fn resize_keeps_corner_pixels() -> Result<()> {
        let frame = gradient_frame(100, 100);
        let small = frame.resize_to_width(10)?;
        // Nearest-neighbour maps (0,0) to (0,0).
        assert_eq!(small.pixel(0, 0), frame.pixel(0, 0));
        Ok(())
    }

    #[test]
    fn crop_clamps_to_bounds() {
        let frame = gradient_frame(100, 100);
        let region = NormalizedRect {
            x: 0.8,
            y: 0.8,
            w: 0.5,
            h: 0.5,
        };
        let crop = frame.crop(&region).expect("clamped crop");
        assert_eq!(crop.width(), 20);
        assert_eq!(crop.height(), 20);
    }

    #[test]
    fn crop_of_empty_region_is_none() {
        let frame = gradient_frame(100, 100);
        let region = NormalizedRect {
            x: 1.0,
            y: 1.0,
            w: 0.5,
            h: 0.5,
        };
        assert!(frame.crop(&region).is_none());
    }

    #[test]
    fn crop_copies_expected_pixels() {
        let frame = gradient_frame(10, 10);
        let region = NormalizedRect {
            x: 0.5,
            y: 0.5,
            w: 0.2,
            h: 0.2,
        };
        let crop = frame.crop(&region).unwrap();
        assert_eq!(crop.pixel(0, 0), frame.pixel(5, 5));
    }

    #[test]
    fn clone_is_independent() {
        let frame = gradient_frame(4, 4);
        let mut copy = frame.clone();
        copy.put_pixel(0, 0, [255, 0, 0]);
        assert_ne!(frame.pixel(0, 0), copy.pixel(0, 0));
    }

    #[test]
    fn put_pixel_ignores_out_of_bounds() {
        let mut frame = gradient_frame(4, 4);
        frame.put_pixel(100, 100, [1, 2, 3]);
        assert!(frame.pixel(100, 100).is_none());
    }
}
