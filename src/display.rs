//! Display sinks.
//!
//! The render loop hands each finished frame to a `DisplaySink`, which
//! presents it somehow and answers one question: keep running? Window
//! management is out of scope; the sinks here cover headless operation
//! (bounded runs for the demo and tests) and, behind the `snapshot-sink`
//! feature, periodic JPEG snapshots for eyeballing the overlay on a box
//! without a display server.

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::frame::Frame;

/// Consumer of finished frames.
///
/// `Send` because the render loop owning the sink may itself be moved onto a
/// dedicated thread.
pub trait DisplaySink: Send {
    /// Present a frame. Returns `false` when the application should exit
    /// (user closed the window, bounded run finished).
    fn show(&mut self, frame: &Frame) -> Result<bool>;
}

/// Sink that consumes frames until a frame-count or wall-clock limit.
pub struct HeadlessSink {
    max_frames: Option<u64>,
    deadline: Option<Instant>,
    throttle: Option<Duration>,
    frames_shown: u64,
}

impl HeadlessSink {
    pub fn new() -> Self {
        Self {
            max_frames: None,
            deadline: None,
            throttle: None,
            frames_shown: 0,
        }
    }

    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.deadline = Some(Instant::now() + duration);
        self
    }

    /// Sleep this long per frame, standing in for a real display's refresh
    /// pacing. Without it the render loop spins flat out re-showing the same
    /// cached frame.
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = Some(throttle);
        self
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }
}

impl Default for HeadlessSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplaySink for HeadlessSink {
    fn show(&mut self, _frame: &Frame) -> Result<bool> {
        if let Some(throttle) = self.throttle {
            std::thread::sleep(throttle);
        }
        self.frames_shown += 1;
        if let Some(max) = self.max_frames {
            if self.frames_shown >= max {
                return Ok(false);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

// ----------------------------------------------------------------------------
// Snapshot sink (feature: snapshot-sink)
// ----------------------------------------------------------------------------

/// Writes every Nth frame as a JPEG into a directory.
#[cfg(feature = "snapshot-sink")]
pub struct SnapshotSink {
    dir: std::path::PathBuf,
    every: u64,
    frames_seen: u64,
    snapshots_written: u64,
}

#[cfg(feature = "snapshot-sink")]
impl SnapshotSink {
    pub fn new<P: Into<std::path::PathBuf>>(dir: P, every: u64) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            every: every.max(1),
            frames_seen: 0,
            snapshots_written: 0,
        })
    }

    pub fn snapshots_written(&self) -> u64 {
        self.snapshots_written
    }
}

#[cfg(feature = "snapshot-sink")]
impl DisplaySink for SnapshotSink {
    fn show(&mut self, frame: &Frame) -> Result<bool> {
        self.frames_seen += 1;
        if self.frames_seen % self.every != 0 {
            return Ok(true);
        }

        let path = self.dir.join(format!("frame_{:06}.jpg", self.frames_seen));
        let buffer = image::RgbImage::from_raw(
            frame.width(),
            frame.height(),
            frame.pixels().to_vec(),
        )
        .ok_or_else(|| anyhow::anyhow!("frame buffer size mismatch"))?;
        buffer.save_with_format(&path, image::ImageFormat::Jpeg)?;
        self.snapshots_written += 1;
        log::debug!("snapshot written to {}", path.display());
        Ok(true)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
