//! Render loop.
//!
//! The orchestrator is the only consumer of the frame stream and the only
//! submitter to the inference workers. One tick, driven as fast as the sink
//! accepts frames:
//!
//! 1. read the latest captured frame (skip the tick when none exists yet);
//! 2. downscale a working copy for cheap landmark inference;
//! 3. offer the working copy to the landmark worker (dropped when busy);
//! 4. read the landmark worker's cached result;
//! 5. when a face is present, crop it from the full-resolution frame and
//!    offer the crop to the age worker;
//! 6. read the age worker's cached result;
//! 7. draw whatever results exist onto the full-resolution frame;
//! 8. hand the frame to the display sink.
//!
//! Nothing in a tick blocks on a worker. Every read is latest-available, so
//! overlays may lag the frame by a tick or more; that staleness is the price
//! of never freezing the feed. The face crop in step 5 deliberately applies
//! the cached landmark box to the current frame even when the box came from
//! an earlier one.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::display::DisplaySink;
use crate::frame::Frame;
use crate::infer::{AgeEstimate, LandmarkResult};
use crate::overlay::OverlayRenderer;
use crate::pipeline::stream::FrameStream;
use crate::pipeline::worker::InferenceWorker;

/// How often the loop emits its health line.
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Why the render loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The display sink asked to exit.
    DisplayClosed,
    /// The capture source died; nothing more will ever arrive.
    SourceExhausted,
    /// The external stop flag (Ctrl-C) was set.
    Interrupted,
}

/// Outcome of a single tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tick {
    /// A frame was rendered and displayed.
    Rendered,
    /// No frame was available yet; nothing was submitted or drawn.
    Skipped,
    /// The sink requested exit.
    ExitRequested,
}

pub struct Orchestrator {
    stream: FrameStream,
    landmarks: InferenceWorker<LandmarkResult>,
    age: Option<InferenceWorker<AgeEstimate>>,
    renderer: OverlayRenderer,
    sink: Box<dyn DisplaySink>,
    processing_width: u32,
    stop_flag: Option<Arc<AtomicBool>>,
    fps: FpsCounter,
    last_health_log: Instant,
    last_logged_age: Option<String>,
    frames_rendered: u64,
}

impl Orchestrator {
    pub fn new(
        stream: FrameStream,
        landmarks: InferenceWorker<LandmarkResult>,
        age: Option<InferenceWorker<AgeEstimate>>,
        renderer: OverlayRenderer,
        sink: Box<dyn DisplaySink>,
        processing_width: u32,
    ) -> Self {
        Self {
            stream,
            landmarks,
            age,
            renderer,
            sink,
            processing_width,
            stop_flag: None,
            fps: FpsCounter::new(),
            last_health_log: Instant::now(),
            last_logged_age: None,
            frames_rendered: 0,
        }
    }

    /// Attach an external stop flag; the loop exits when it reads true.
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Run ticks until something ends the loop, then stop every component
    /// with bounded waits.
    pub fn run(&mut self) -> Result<StopReason> {
        let reason = loop {
            if self
                .stop_flag
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Relaxed))
            {
                break StopReason::Interrupted;
            }
            if !self.stream.is_running() {
                break StopReason::SourceExhausted;
            }
            match self.tick()? {
                Tick::Rendered => {}
                Tick::ExitRequested => break StopReason::DisplayClosed,
                // Capture has not produced anything yet; yield briefly
                // instead of spinning.
                Tick::Skipped => std::thread::sleep(Duration::from_millis(1)),
            }
        };

        match reason {
            StopReason::SourceExhausted => {
                log::error!("capture source exhausted, shutting down")
            }
            StopReason::Interrupted => log::info!("interrupted, shutting down"),
            StopReason::DisplayClosed => log::info!("display closed, shutting down"),
        }
        self.shutdown();
        Ok(reason)
    }

    /// One pass of the render loop. Never blocks on a worker.
    pub fn tick(&mut self) -> Result<Tick> {
        let Some(mut frame) = self.stream.latest_frame() else {
            return Ok(Tick::Skipped);
        };

        let working = frame.resize_to_width(self.processing_width)?;
        self.landmarks.submit(working);

        let landmark_result = self.landmarks.latest();

        if let (Some(age_worker), Some(result)) = (self.age.as_ref(), landmark_result.as_ref()) {
            if let Some(face_box) = result.face_box() {
                // Full-resolution crop: age accuracy benefits from every
                // pixel the capture delivered.
                if let Some(crop) = frame.crop(&face_box) {
                    age_worker.submit(crop);
                }
            }
        }
        let age_result = self.age.as_ref().and_then(|worker| worker.latest());

        self.renderer
            .draw(&mut frame, landmark_result.as_ref(), age_result.as_ref());

        self.note_age(age_result.as_ref());
        self.fps.tick();
        self.frames_rendered += 1;
        self.log_health(landmark_result.as_ref(), age_result.as_ref());

        if self.sink.show(&frame)? {
            Ok(Tick::Rendered)
        } else {
            Ok(Tick::ExitRequested)
        }
    }

    /// Stop workers and stream. Idempotent; also invoked by `run`.
    pub fn shutdown(&mut self) {
        if let Some(age) = self.age.as_mut() {
            age.stop();
        }
        self.landmarks.stop();
        self.stream.stop();
    }

    fn note_age(&mut self, age: Option<&AgeEstimate>) {
        let Some(age) = age else {
            return;
        };
        if self.last_logged_age.as_deref() != Some(age.bucket.as_str()) {
            log::info!(
                "age estimate: {} (confidence {:.2})",
                age.bucket,
                age.confidence
            );
            self.last_logged_age = Some(age.bucket.clone());
        }
    }

    fn log_health(&mut self, landmarks: Option<&LandmarkResult>, age: Option<&AgeEstimate>) {
        if self.last_health_log.elapsed() < HEALTH_LOG_INTERVAL {
            return;
        }
        log::info!(
            "render loop: {:.1} fps, {} frames, landmarks={}, age={}",
            self.fps.fps(),
            self.frames_rendered,
            landmarks.map_or("none", |r| if r.has_any() { "yes" } else { "empty" }),
            age.map_or("none", |a| a.bucket.as_str()),
        );
        self.last_health_log = Instant::now();
    }
}

// ----------------------------------------------------------------------------
// FPS counter
// ----------------------------------------------------------------------------

/// Instantaneous frames-per-second over the last tick interval.
struct FpsCounter {
    prev_tick: Option<Instant>,
    current: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            prev_tick: None,
            current: 0.0,
        }
    }

    fn tick(&mut self) {
        let now = Instant::now();
        if let Some(prev) = self.prev_tick {
            let delta = now.duration_since(prev).as_secs_f32();
            if delta > 0.0 {
                self.current = 1.0 / delta;
            }
        }
        self.prev_tick = Some(now);
    }

    fn fps(&self) -> f32 {
        self.current
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
