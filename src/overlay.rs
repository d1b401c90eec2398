//! Overlay rendering.
//!
//! Draws whatever results are available onto the display frame, in place.
//! Drawing is cosmetic: it is idempotent, stays inside the frame bounds, and
//! cannot fail in a way the pipeline needs to recover from. A missing result
//! simply leaves the frame untouched by that overlay.
//!
//! The age bucket label is not rasterized into pixels (no font machinery
//! here); the face box and a confidence bar mark the estimate on-frame and
//! the label goes to the log.

use crate::config::LandmarkSettings;
use crate::frame::{Frame, NormalizedRect};
use crate::infer::{AgeEstimate, Landmark, LandmarkResult};

const FACE_COLOR: [u8; 3] = [0, 255, 255];
const POSE_COLOR: [u8; 3] = [255, 0, 255];
const HAND_COLOR: [u8; 3] = [0, 255, 0];
const AGE_BAR_COLOR: [u8; 3] = [50, 255, 50];

/// Half-size of a landmark marker in pixels.
const MARKER: i64 = 1;

/// Overlay renderer. Holds per-kind enable flags; everything else comes from
/// the results themselves.
pub struct OverlayRenderer {
    settings: LandmarkSettings,
}

impl OverlayRenderer {
    pub fn new(settings: LandmarkSettings) -> Self {
        Self { settings }
    }

    /// Draw all available results onto `frame`.
    pub fn draw(
        &self,
        frame: &mut Frame,
        landmarks: Option<&LandmarkResult>,
        age: Option<&AgeEstimate>,
    ) {
        let Some(landmarks) = landmarks else {
            return;
        };

        if self.settings.enable_face {
            if let Some(face) = landmarks.face.as_deref() {
                draw_landmarks(frame, face, FACE_COLOR);
            }
            if let Some(face_box) = landmarks.face_box() {
                draw_rect(frame, &face_box, FACE_COLOR);
                // Age is anchored to wherever the face currently is, even if
                // the estimate was computed from an earlier crop.
                if let Some(age) = age {
                    draw_age_bar(frame, &face_box, age);
                }
            }
        }
        if self.settings.enable_pose {
            if let Some(pose) = landmarks.pose.as_deref() {
                draw_landmarks(frame, pose, POSE_COLOR);
            }
        }
        if self.settings.enable_hands {
            if let Some(hand) = landmarks.left_hand.as_deref() {
                draw_landmarks(frame, hand, HAND_COLOR);
            }
            if let Some(hand) = landmarks.right_hand.as_deref() {
                draw_landmarks(frame, hand, HAND_COLOR);
            }
        }
    }
}

fn draw_landmarks(frame: &mut Frame, landmarks: &[Landmark], color: [u8; 3]) {
    let width = frame.width() as f32;
    let height = frame.height() as f32;
    for lm in landmarks {
        let cx = (lm.x * width) as i64;
        let cy = (lm.y * height) as i64;
        for dy in -MARKER..=MARKER {
            for dx in -MARKER..=MARKER {
                let x = cx + dx;
                let y = cy + dy;
                if x >= 0 && y >= 0 {
                    frame.put_pixel(x as u32, y as u32, color);
                }
            }
        }
    }
}

fn draw_rect(frame: &mut Frame, rect: &NormalizedRect, color: [u8; 3]) {
    let (x, y, w, h) = rect.to_pixels(frame.width(), frame.height());
    if w == 0 || h == 0 {
        return;
    }
    for px in x..x + w {
        frame.put_pixel(px, y, color);
        frame.put_pixel(px, y + h - 1, color);
    }
    for py in y..y + h {
        frame.put_pixel(x, py, color);
        frame.put_pixel(x + w - 1, py, color);
    }
}

/// Horizontal bar just above the face box; its length is proportional to the
/// estimate's confidence.
fn draw_age_bar(frame: &mut Frame, face_box: &NormalizedRect, age: &AgeEstimate) {
    let (x, y, w, _h) = face_box.to_pixels(frame.width(), frame.height());
    if w == 0 {
        return;
    }
    let bar_len = ((w as f32) * age.confidence.clamp(0.0, 1.0)) as u32;
    let bar_y = y.saturating_sub(4);
    for py in bar_y..bar_y.saturating_add(2).min(frame.height()) {
        for px in x..x + bar_len {
            frame.put_pixel(px, py, AGE_BAR_COLOR);
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
