//! Frame capture sources.
//!
//! A capture source produces owned `Frame`s at whatever rate the device
//! delivers. Sources available:
//! - Synthetic scene (`stub://` devices): deterministic moving-subject frames
//!   so the demo and tests run without hardware.
//! - V4L2 devices (feature: ingest-v4l2): local cameras via /dev/video*.
//!
//! Capture failure is permanent: a source that returns an error is considered
//! lost, and the stream built on top of it stops. There is no reconnection
//! logic at this layer.

#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

mod synthetic;

pub use synthetic::SyntheticCapture;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Capture;

use anyhow::Result;

use crate::config::CameraSettings;
use crate::frame::Frame;

/// A source of captured frames.
///
/// `next_frame` blocks until the device delivers the next frame. An `Err`
/// means the device is gone for good (unplugged, stream ended); callers stop
/// polling after the first error.
pub trait Capture: Send {
    fn next_frame(&mut self) -> Result<Frame>;
}

/// Open the capture source described by `settings.device`.
///
/// `stub://…` devices get the synthetic scene; anything else is treated as a
/// V4L2 device path and requires the `ingest-v4l2` feature.
pub fn open_capture(settings: &CameraSettings) -> Result<Box<dyn Capture>> {
    if settings.device.starts_with("stub://") {
        return Ok(Box::new(SyntheticCapture::new(settings.clone())));
    }

    #[cfg(feature = "ingest-v4l2")]
    {
        let mut source = V4l2Capture::new(settings.clone())?;
        source.connect()?;
        Ok(Box::new(source))
    }
    #[cfg(not(feature = "ingest-v4l2"))]
    {
        anyhow::bail!(
            "device {} requires the ingest-v4l2 feature (or use a stub:// device)",
            settings.device
        )
    }
}
