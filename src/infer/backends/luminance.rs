//! Dependency-free landmark backend.
//!
//! Estimates a face region as the brightest coherent area of the frame on a
//! coarse luminance grid. Under the usual webcam setup (lit face against a
//! darker background) this is a serviceable stand-in; it exists so the
//! pipeline runs end-to-end without a model file, and as the reference
//! implementation of the backend contract.

use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::frame::Frame;
use crate::infer::backend::InferenceBackend;
use crate::infer::landmarks::{Landmark, LandmarkResult};

/// Grid cells per axis for the luminance scan.
const GRID: u32 = 16;

/// Luminance landmark backend.
pub struct LuminanceLandmarks {
    /// Peak cell must exceed the frame mean by this factor to count as a
    /// detection.
    min_contrast: f32,
    last_hash: Option<[u8; 32]>,
    last_result: Option<LandmarkResult>,
}

impl LuminanceLandmarks {
    pub fn new() -> Self {
        Self {
            min_contrast: 1.2,
            last_hash: None,
            last_result: None,
        }
    }

    /// Override the contrast gate. Values near 1.0 detect on almost any
    /// frame; larger values require a clearly lit subject.
    pub fn with_min_contrast(mut self, min_contrast: f32) -> Self {
        self.min_contrast = min_contrast;
        self
    }

    fn scan(&self, frame: &Frame) -> Option<LandmarkResult> {
        let cells = luminance_grid(frame);
        let mean = cells.iter().sum::<f32>() / cells.len() as f32;
        let (peak_idx, &peak) = cells
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))?;
        if mean <= 0.0 || peak / mean < self.min_contrast {
            return None;
        }

        // Grow a box around the peak cell over all cells close to the peak.
        let threshold = mean + (peak - mean) * 0.5;
        let peak_x = (peak_idx as u32) % GRID;
        let peak_y = (peak_idx as u32) / GRID;
        let mut min_x = peak_x;
        let mut max_x = peak_x;
        let mut min_y = peak_y;
        let mut max_y = peak_y;
        for (idx, &value) in cells.iter().enumerate() {
            if value < threshold {
                continue;
            }
            let x = (idx as u32) % GRID;
            let y = (idx as u32) / GRID;
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        let cell = 1.0 / GRID as f32;
        let left = min_x as f32 * cell;
        let right = (max_x + 1) as f32 * cell;
        let top = min_y as f32 * cell;
        let bottom = (max_y + 1) as f32 * cell;

        let face = vec![
            Landmark::new(left, top),
            Landmark::new(right, top),
            Landmark::new(right, bottom),
            Landmark::new(left, bottom),
            Landmark::new((left + right) / 2.0, (top + bottom) / 2.0),
        ];

        Some(LandmarkResult {
            face: Some(face),
            ..LandmarkResult::default()
        })
    }
}

impl Default for LuminanceLandmarks {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for LuminanceLandmarks {
    type Output = LandmarkResult;

    fn name(&self) -> &'static str {
        "luminance-landmarks"
    }

    fn infer(&mut self, frame: &Frame) -> Result<Option<LandmarkResult>> {
        // An unchanged frame yields the previous answer without a rescan.
        let hash: [u8; 32] = Sha256::digest(frame.pixels()).into();
        if self.last_hash == Some(hash) {
            return Ok(self.last_result.clone());
        }

        let result = self.scan(frame);
        self.last_hash = Some(hash);
        self.last_result = result.clone();
        Ok(result)
    }
}

/// Mean luminance per grid cell, row-major `GRID * GRID` values.
fn luminance_grid(frame: &Frame) -> Vec<f32> {
    let mut sums = vec![0.0f64; (GRID * GRID) as usize];
    let mut counts = vec![0u32; (GRID * GRID) as usize];
    let width = frame.width();
    let height = frame.height();
    let pixels = frame.pixels();

    for y in 0..height {
        let cell_y = (y * GRID / height).min(GRID - 1);
        for x in 0..width {
            let cell_x = (x * GRID / width).min(GRID - 1);
            let idx = (y as usize * width as usize + x as usize) * 3;
            // Rec. 601 luma weights.
            let luma = 0.299 * pixels[idx] as f64
                + 0.587 * pixels[idx + 1] as f64
                + 0.114 * pixels[idx + 2] as f64;
            let cell = (cell_y * GRID + cell_x) as usize;
            sums[cell] += luma;
            counts[cell] += 1;
        }
    }

    sums.iter()
        .zip(&counts)
        .map(|(sum, &count)| {
            if count == 0 {
                0.0
            } else {
                (sum / count as f64) as f32
            }
        })
        .collect()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
