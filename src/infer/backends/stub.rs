//! Deterministic stub backends for tests and the synthetic demo.

use anyhow::Result;
use std::time::Duration;

use crate::frame::{Frame, NormalizedRect};
use crate::infer::age::{estimate_from_scores, AgeEstimate, AGE_BUCKETS};
use crate::infer::backend::InferenceBackend;
use crate::infer::landmarks::{Landmark, LandmarkResult};

/// Landmark backend that reports a fixed face region on every frame, with an
/// optional artificial delay to simulate a slow model.
pub struct StubLandmarks {
    region: NormalizedRect,
    delay: Duration,
}

impl StubLandmarks {
    pub fn new(region: NormalizedRect) -> Self {
        Self {
            region,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl InferenceBackend for StubLandmarks {
    type Output = LandmarkResult;

    fn name(&self) -> &'static str {
        "stub-landmarks"
    }

    fn infer(&mut self, _frame: &Frame) -> Result<Option<LandmarkResult>> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let r = self.region;
        let face = vec![
            Landmark::new(r.x, r.y),
            Landmark::new(r.x + r.w, r.y),
            Landmark::new(r.x + r.w, r.y + r.h),
            Landmark::new(r.x, r.y + r.h),
        ];
        Ok(Some(LandmarkResult {
            face: Some(face),
            ..LandmarkResult::default()
        }))
    }
}

/// Age backend that derives a bucket from mean brightness of the crop.
///
/// Obviously not a classifier; it gives the demo a stable, reproducible
/// estimate without model files, through the same scoring path the real
/// backend uses.
pub struct StubAge {
    threshold: f32,
    delay: Duration,
}

impl StubAge {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl InferenceBackend for StubAge {
    type Output = AgeEstimate;

    fn name(&self) -> &'static str {
        "stub-age"
    }

    fn infer(&mut self, frame: &Frame) -> Result<Option<AgeEstimate>> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let pixels = frame.pixels();
        if pixels.is_empty() {
            return Ok(None);
        }
        let mean =
            pixels.iter().map(|&p| p as u64).sum::<u64>() / pixels.len() as u64;
        let bucket = (mean as usize * AGE_BUCKETS.len() / 256).min(AGE_BUCKETS.len() - 1);

        let mut scores = [0.0f32; 8];
        scores[bucket] = 0.9;
        Ok(estimate_from_scores(&scores, self.threshold))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_landmarks_report_the_configured_region() {
        let region = NormalizedRect {
            x: 0.2,
            y: 0.2,
            w: 0.4,
            h: 0.4,
        };
        let mut backend = StubLandmarks::new(region);
        let frame = Frame::blank(16, 16).unwrap();
        let result = backend.infer(&frame).unwrap().unwrap();
        let face_box = result.face_box().unwrap();
        // Face box is the region plus padding.
        assert!(face_box.x <= region.x && face_box.x + face_box.w >= region.x + region.w);
    }

    #[test]
    fn stub_age_maps_brightness_to_bucket() {
        let mut backend = StubAge::new(0.5);

        let dark = Frame::blank(8, 8).unwrap();
        let estimate = backend.infer(&dark).unwrap().unwrap();
        assert_eq!(estimate.bucket, AGE_BUCKETS[0]);

        let bright = Frame::new(vec![250u8; 8 * 8 * 3], 8, 8).unwrap();
        let estimate = backend.infer(&bright).unwrap().unwrap();
        assert_eq!(estimate.bucket, AGE_BUCKETS[7]);
    }

    #[test]
    fn stub_age_respects_threshold() {
        let mut backend = StubAge::new(0.95);
        let frame = Frame::blank(8, 8).unwrap();
        assert!(backend.infer(&frame).unwrap().is_none());
    }
}
