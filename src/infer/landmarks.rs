//! Landmark result types.
//!
//! Landmarks are normalized 0..1 coordinates, so results computed on a
//! downscaled working copy apply unchanged to the full-resolution frame.
//! The pipeline never interprets landmark topology; it only tests presence
//! and derives a face bounding box for the dependent age stage.

use crate::frame::NormalizedRect;

/// Fractional padding added around the raw landmark extent when deriving the
/// face box. A tight box crops away chin and forehead, which measurably hurts
/// downstream age classification.
pub const FACE_BOX_PADDING: f32 = 0.1;

/// A single landmark in normalized coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Output of one landmark-inference pass. Every part is optional; a detector
/// reports only what it found on this frame.
#[derive(Clone, Debug, Default)]
pub struct LandmarkResult {
    pub face: Option<Vec<Landmark>>,
    pub pose: Option<Vec<Landmark>>,
    pub left_hand: Option<Vec<Landmark>>,
    pub right_hand: Option<Vec<Landmark>>,
}

impl LandmarkResult {
    pub fn has_any(&self) -> bool {
        self.face.is_some()
            || self.pose.is_some()
            || self.left_hand.is_some()
            || self.right_hand.is_some()
    }

    /// Padded bounding box of the face landmarks, if any were detected.
    pub fn face_box(&self) -> Option<NormalizedRect> {
        self.face.as_deref().and_then(face_bounding_box)
    }
}

/// Normalized bounding box of a landmark set, padded by [`FACE_BOX_PADDING`]
/// on each axis and clamped into the unit square.
pub fn face_bounding_box(landmarks: &[Landmark]) -> Option<NormalizedRect> {
    if landmarks.is_empty() {
        return None;
    }

    let mut x_min = 1.0f32;
    let mut y_min = 1.0f32;
    let mut x_max = 0.0f32;
    let mut y_max = 0.0f32;
    for lm in landmarks {
        x_min = x_min.min(lm.x);
        y_min = y_min.min(lm.y);
        x_max = x_max.max(lm.x);
        y_max = y_max.max(lm.y);
    }

    let pad_x = (x_max - x_min) * FACE_BOX_PADDING;
    let pad_y = (y_max - y_min) * FACE_BOX_PADDING;

    let x_min = (x_min - pad_x).max(0.0);
    let y_min = (y_min - pad_y).max(0.0);
    let x_max = (x_max + pad_x).min(1.0);
    let y_max = (y_max + pad_y).min(1.0);

    Some(NormalizedRect {
        x: x_min,
        y: y_min,
        w: x_max - x_min,
        h: y_max - y_min,
    })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_landmarks_have_no_box() {
        assert!(face_bounding_box(&[]).is_none());
        assert!(LandmarkResult::default().face_box().is_none());
    }

    #[test]
    fn box_is_padded_beyond_landmark_extent() {
        let landmarks = [Landmark::new(0.4, 0.4), Landmark::new(0.6, 0.6)];
        let rect = face_bounding_box(&landmarks).unwrap();

        // Raw extent is 0.4..0.6; 10% of 0.2 is 0.02 padding on each side.
        assert!((rect.x - 0.38).abs() < 1e-6);
        assert!((rect.y - 0.38).abs() < 1e-6);
        assert!((rect.w - 0.24).abs() < 1e-6);
        assert!((rect.h - 0.24).abs() < 1e-6);
    }

    #[test]
    fn box_clamps_at_frame_edges() {
        let landmarks = [Landmark::new(0.0, 0.0), Landmark::new(1.0, 1.0)];
        let rect = face_bounding_box(&landmarks).unwrap();
        assert_eq!(rect.x, 0.0);
        assert_eq!(rect.y, 0.0);
        assert_eq!(rect.w, 1.0);
        assert_eq!(rect.h, 1.0);
    }

    #[test]
    fn single_landmark_yields_degenerate_box() {
        let rect = face_bounding_box(&[Landmark::new(0.5, 0.5)]).unwrap();
        assert_eq!(rect.w, 0.0);
        assert_eq!(rect.h, 0.0);
    }

    #[test]
    fn has_any_reports_partial_results() {
        let result = LandmarkResult {
            pose: Some(vec![Landmark::new(0.1, 0.1)]),
            ..LandmarkResult::default()
        };
        assert!(result.has_any());
        assert!(result.face_box().is_none());
    }
}
