//! Background frame stream.
//!
//! Structurally a degenerate inference worker: a capture loop that publishes
//! every successful frame into a latest-value cache. The capture rate is
//! whatever the device delivers; there is no pacing timer here.
//!
//! A capture error is treated as the device being gone for good. The loop
//! stops, `is_running` flips to false, and the render loop is expected to
//! notice and shut the whole pipeline down.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::frame::Frame;
use crate::ingest::Capture;
use crate::pipeline::cache::{result_cache, ResultReader};
use crate::pipeline::worker::JOIN_TIMEOUT;

/// Handle to a running capture stream.
pub struct FrameStream {
    frames: ResultReader<Frame>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl FrameStream {
    /// Spawn the capture loop. The capture source moves onto the stream
    /// thread and is dropped there when the loop ends.
    pub fn spawn(mut capture: Box<dyn Capture>) -> Self {
        let (writer, frames) = result_cache();
        let running = Arc::new(AtomicBool::new(true));

        let thread = {
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("frame-stream".to_string())
                .spawn(move || {
                    while running.load(Ordering::Relaxed) {
                        match capture.next_frame() {
                            Ok(frame) => writer.publish(frame),
                            Err(e) => {
                                log::error!("frame stream: capture failed, stopping: {:#}", e);
                                running.store(false, Ordering::Relaxed);
                                break;
                            }
                        }
                    }
                    log::debug!("frame stream stopped");
                })
                .expect("spawn frame stream thread")
        };

        Self {
            frames,
            running,
            thread: Some(thread),
        }
    }

    /// Deep copy of the most recent captured frame, or `None` before the
    /// first capture completes. The copy is independent of anything the
    /// capture loop does next.
    pub fn latest_frame(&self) -> Option<Frame> {
        self.frames.read()
    }

    /// False once the capture loop has stopped, including after a fatal
    /// capture error.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
            && self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the capture loop with a bounded join. Safe to call repeatedly,
    /// and after the loop already died on its own.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);

        let Some(thread) = self.thread.take() else {
            return;
        };

        let deadline = Instant::now() + JOIN_TIMEOUT;
        while !thread.is_finished() {
            if Instant::now() >= deadline {
                log::warn!(
                    "frame stream did not stop within {:?}, abandoning thread",
                    JOIN_TIMEOUT
                );
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }

        if thread.join().is_err() {
            log::warn!("frame stream thread panicked");
        }
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};

    /// Capture source that produces `good` frames and then fails.
    struct CountdownCapture {
        remaining: u32,
        counter: u8,
    }

    impl CountdownCapture {
        fn new(good: u32) -> Self {
            Self {
                remaining: good,
                counter: 0,
            }
        }
    }

    impl Capture for CountdownCapture {
        fn next_frame(&mut self) -> Result<Frame> {
            if self.remaining == 0 {
                return Err(anyhow!("device lost"));
            }
            self.remaining -= 1;
            self.counter = self.counter.wrapping_add(1);
            // Pace the loop so the test can observe intermediate state.
            thread::sleep(Duration::from_millis(5));
            Frame::new(vec![self.counter; 4 * 4 * 3], 4, 4)
        }
    }

    fn wait_for<F: Fn() -> bool>(cond: F, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    #[test]
    fn publishes_latest_frame() {
        let mut stream = FrameStream::spawn(Box::new(CountdownCapture::new(1000)));

        assert!(wait_for(
            || stream.latest_frame().is_some(),
            Duration::from_secs(2)
        ));
        let frame = stream.latest_frame().unwrap();
        assert_eq!(frame.width(), 4);
        stream.stop();
    }

    #[test]
    fn capture_error_stops_the_stream() {
        let mut stream = FrameStream::spawn(Box::new(CountdownCapture::new(3)));

        assert!(wait_for(|| !stream.is_running(), Duration::from_secs(2)));
        // The last good frame stays readable after the loop died.
        assert!(stream.latest_frame().is_some());
        // Stopping an already-dead stream is fine.
        stream.stop();
    }

    #[test]
    fn latest_frame_is_an_independent_copy() {
        let mut stream = FrameStream::spawn(Box::new(CountdownCapture::new(1000)));
        assert!(wait_for(
            || stream.latest_frame().is_some(),
            Duration::from_secs(2)
        ));

        let mut first = stream.latest_frame().unwrap();
        let second = stream.latest_frame().unwrap();
        let untouched = second.pixel(0, 0);
        // Mutating one read must not leak into another holder's copy.
        first.put_pixel(0, 0, [7, 7, 7]);
        assert_eq!(second.pixel(0, 0), untouched);
        stream.stop();
    }

    #[test]
    fn stop_returns_within_bound() {
        let mut stream = FrameStream::spawn(Box::new(CountdownCapture::new(u32::MAX)));
        let start = Instant::now();
        stream.stop();
        assert!(start.elapsed() < JOIN_TIMEOUT + Duration::from_millis(500));
        assert!(!stream.is_running());
    }
}
