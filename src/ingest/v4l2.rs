//! V4L2 capture source.
//!
//! Captures RGB frames from a local device node (e.g. /dev/video0). The
//! device's actual format wins when it refuses the requested one, so frames
//! may come back at a different resolution than configured; the pipeline is
//! resolution-agnostic and does not care.

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use crate::config::CameraSettings;
use crate::frame::Frame;
use crate::ingest::Capture;

/// V4L2 capture source.
pub struct V4l2Capture {
    settings: CameraSettings,
    state: Option<V4l2State>,
    frame_count: u64,
    active_width: u32,
    active_height: u32,
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Capture {
    pub fn new(settings: CameraSettings) -> Result<Self> {
        Ok(Self {
            active_width: settings.width,
            active_height: settings.height,
            settings,
            state: None,
            frame_count: 0,
        })
    }

    /// Open the device and start the capture stream.
    pub fn connect(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.settings.device)
            .with_context(|| format!("open v4l2 device {}", self.settings.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.settings.width;
        format.height = self.settings.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "v4l2 capture: failed to set format on {}: {}",
                    self.settings.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        if self.settings.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.settings.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "v4l2 capture: failed to set fps on {}: {}",
                    self.settings.device,
                    err
                );
            }
        }

        self.active_width = format.width;
        self.active_height = format.height;

        let state = V4l2StateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);

        log::info!(
            "v4l2 capture: connected to {} ({}x{})",
            self.settings.device,
            self.active_width,
            self.active_height
        );
        Ok(())
    }
}

impl Capture for V4l2Capture {
    fn next_frame(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("v4l2 device not connected")?;
        let (buf, _meta) = state
            .with_mut(|fields| fields.stream.next())
            .map_err(|err| anyhow::Error::new(err).context("capture v4l2 frame"))?;

        self.frame_count += 1;
        Frame::new(buf.to_vec(), self.active_width, self.active_height)
    }
}
