//! Live annotation pipeline.
//!
//! Captures live video, runs landmark detection and age estimation in
//! background workers, and overlays the results on the feed in near real
//! time. The inference stages are slower than the display loop and must
//! never stall it, so everything hangs off two small primitives:
//!
//! - a capacity-1 handoff slot per worker (new work is dropped, not queued,
//!   while the worker is busy), and
//! - a latest-value result cache per worker (the render loop always reads
//!   the best currently-available result, which may lag the frame on screen).
//!
//! The render loop therefore always produces a frame: missing or stale
//! annotations degrade the overlay, never the feed.
//!
//! # Module Structure
//!
//! - `frame`: owned RGB frames, downscale and crop
//! - `pipeline`: handoff slot, result cache, workers, capture stream, render
//!   loop
//! - `ingest`: capture sources (synthetic, V4L2)
//! - `infer`: inference backends (landmarks, age)
//! - `overlay`: drawing results onto frames
//! - `display`: display sinks (headless, JPEG snapshots)
//! - `config`: file + environment configuration

pub mod config;
pub mod display;
pub mod frame;
pub mod infer;
pub mod ingest;
pub mod overlay;
pub mod pipeline;

pub use config::{AgeSettings, AppConfig, CameraSettings, LandmarkSettings};
#[cfg(feature = "snapshot-sink")]
pub use display::SnapshotSink;
pub use display::{DisplaySink, HeadlessSink};
pub use frame::{Frame, NormalizedRect};
#[cfg(feature = "backend-tract")]
pub use infer::AgeNetBackend;
pub use infer::{
    AgeEstimate, InferenceBackend, Landmark, LandmarkResult, LuminanceLandmarks, StubAge,
    StubLandmarks,
};
pub use ingest::{open_capture, Capture, SyntheticCapture};
pub use overlay::OverlayRenderer;
pub use pipeline::{FrameStream, InferenceWorker, Orchestrator, StopReason};
