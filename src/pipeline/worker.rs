//! Background inference worker.
//!
//! An `InferenceWorker` owns a backend, an input `HandoffSlot`, and the
//! writing half of a result cache. Its loop:
//!
//! 1. `try_take` on the input slot with a short timeout (so the shutdown flag
//!    is observed at least every [`INPUT_POLL`]);
//! 2. run the backend synchronously on the received frame;
//! 3. publish the output, or log and skip on an inference error.
//!
//! Submission against a busy worker is refused, not queued: at most one frame
//! waits while one is in flight, which bounds both memory and result
//! staleness. The render loop tolerates refusal by reusing the cached result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::frame::Frame;
use crate::infer::InferenceBackend;
use crate::pipeline::cache::{result_cache, ResultReader, ResultWriter};
use crate::pipeline::slot::HandoffSlot;

/// How long the worker loop waits on its input slot before re-checking the
/// run flag.
pub const INPUT_POLL: Duration = Duration::from_millis(100);

/// Bounded wait for the worker thread to exit during `stop`.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Handle to a running inference worker.
pub struct InferenceWorker<R> {
    name: &'static str,
    input: Arc<HandoffSlot<Frame>>,
    results: ResultReader<R>,
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl<R: Clone + Send + 'static> InferenceWorker<R> {
    /// Spawn a worker around `backend`. The backend moves onto the worker
    /// thread and warms up there before the first frame.
    pub fn spawn<B>(backend: B) -> Self
    where
        B: InferenceBackend<Output = R> + 'static,
    {
        let name = backend.name();
        let input = Arc::new(HandoffSlot::reject_if_busy());
        let (writer, results) = result_cache();
        let running = Arc::new(AtomicBool::new(true));

        let thread = {
            let input = Arc::clone(&input);
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name(format!("infer-{}", name))
                .spawn(move || worker_loop(backend, input, writer, running))
                .expect("spawn inference worker thread")
        };

        Self {
            name,
            input,
            results,
            running,
            thread: Some(thread),
        }
    }

    /// Offer a frame to the worker. Returns `false` when the worker is busy
    /// and the frame was dropped; this is backpressure, not an error.
    pub fn submit(&self, frame: Frame) -> bool {
        if !self.running.load(Ordering::Relaxed) {
            return false;
        }
        let accepted = self.input.try_submit(frame);
        if !accepted {
            log::trace!("{}: busy, frame dropped", self.name);
        }
        accepted
    }

    /// Most recent published result, if any. Never blocks.
    pub fn latest(&self) -> Option<R> {
        self.results.read()
    }

    /// A clonable reader for the worker's result cache.
    pub fn reader(&self) -> ResultReader<R> {
        self.results.clone()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True while the worker loop is alive. Goes false after `stop`, or when
    /// the worker disabled itself (warm-up failure).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
            && self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the worker: flag it down, discard any pending input, then join
    /// with a bounded wait. Safe to call repeatedly and on workers that never
    /// produced anything or already died.
    ///
    /// A thread that fails to exit within [`JOIN_TIMEOUT`] is reported and
    /// abandoned; that is acceptable only because stop happens at process
    /// exit.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        self.input.clear();

        let Some(thread) = self.thread.take() else {
            return;
        };

        let deadline = Instant::now() + JOIN_TIMEOUT;
        while !thread.is_finished() {
            if Instant::now() >= deadline {
                log::warn!(
                    "{}: worker did not stop within {:?}, abandoning thread",
                    self.name,
                    JOIN_TIMEOUT
                );
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }

        if thread.join().is_err() {
            log::warn!("{}: worker thread panicked", self.name);
        }
    }
}

impl<R> Drop for InferenceWorker<R> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        self.input.clear();
        // Best effort: the thread observes the flag within INPUT_POLL.
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn worker_loop<B>(
    mut backend: B,
    input: Arc<HandoffSlot<Frame>>,
    writer: ResultWriter<B::Output>,
    running: Arc<AtomicBool>,
) where
    B: InferenceBackend,
{
    let name = backend.name();

    if let Err(e) = backend.warm_up() {
        log::error!("{}: warm-up failed, worker disabled: {:#}", name, e);
        running.store(false, Ordering::Relaxed);
        return;
    }
    log::info!("{}: worker ready", name);

    while running.load(Ordering::Relaxed) {
        let Some(frame) = input.try_take(INPUT_POLL) else {
            continue;
        };
        match backend.infer(&frame) {
            Ok(Some(result)) => writer.publish(result),
            // Nothing confident this cycle; the previous result stays current.
            Ok(None) => {}
            // One bad frame must not take the worker down.
            Err(e) => log::warn!("{}: inference failed, skipping frame: {:#}", name, e),
        }
    }

    log::debug!("{}: worker stopped", name);
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use std::sync::atomic::AtomicU32;

    fn test_frame(seed: u8) -> Frame {
        Frame::new(vec![seed; 4 * 4 * 3], 4, 4).unwrap()
    }

    /// Backend that records the first pixel byte of each frame it sees, with
    /// a configurable per-frame delay.
    struct SlowEcho {
        delay: Duration,
        processed: Arc<AtomicU32>,
    }

    impl InferenceBackend for SlowEcho {
        type Output = u8;

        fn name(&self) -> &'static str {
            "slow-echo"
        }

        fn infer(&mut self, frame: &Frame) -> Result<Option<u8>> {
            thread::sleep(self.delay);
            self.processed.fetch_add(1, Ordering::Relaxed);
            Ok(Some(frame.pixels()[0]))
        }
    }

    struct FailEveryFrame;

    impl InferenceBackend for FailEveryFrame {
        type Output = u8;

        fn name(&self) -> &'static str {
            "fail-every-frame"
        }

        fn infer(&mut self, _frame: &Frame) -> Result<Option<u8>> {
            Err(anyhow!("synthetic failure"))
        }
    }

    struct FailingWarmUp;

    impl InferenceBackend for FailingWarmUp {
        type Output = u8;

        fn name(&self) -> &'static str {
            "failing-warm-up"
        }

        fn warm_up(&mut self) -> Result<()> {
            Err(anyhow!("model missing"))
        }

        fn infer(&mut self, _frame: &Frame) -> Result<Option<u8>> {
            unreachable!("warm-up never succeeds")
        }
    }

    /// Reports a value on the first frame, then goes quiet.
    struct OneShot {
        fired: bool,
    }

    impl InferenceBackend for OneShot {
        type Output = u8;

        fn name(&self) -> &'static str {
            "one-shot"
        }

        fn infer(&mut self, _frame: &Frame) -> Result<Option<u8>> {
            if self.fired {
                Ok(None)
            } else {
                self.fired = true;
                Ok(Some(9))
            }
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
    fn publishes_result_for_accepted_frame() {
        let processed = Arc::new(AtomicU32::new(0));
        let mut worker = InferenceWorker::spawn(SlowEcho {
            delay: Duration::from_millis(0),
            processed: Arc::clone(&processed),
        });

        assert!(worker.submit(test_frame(42)));
        assert!(wait_for(
            || worker.latest() == Some(42),
            Duration::from_secs(2)
        ));
        worker.stop();
    }

    #[test]
    fn drops_submissions_while_busy() {
        let processed = Arc::new(AtomicU32::new(0));
        let mut worker = InferenceWorker::spawn(SlowEcho {
            delay: Duration::from_millis(150),
            processed: Arc::clone(&processed),
        });

        // First submission is accepted; once the worker picks it up, a second
        // is accepted into the empty slot; further ones are refused until the
        // slot drains.
        assert!(worker.submit(test_frame(1)));
        let mut accepted = 1u32;
        let mut rejected = 0u32;
        for seed in 2..=5u8 {
            if worker.submit(test_frame(seed)) {
                accepted += 1;
            } else {
                rejected += 1;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(rejected >= 1, "expected at least one busy drop");
        assert!(accepted < 5);

        // Everything accepted is eventually processed, nothing more.
        assert!(wait_for(
            || processed.load(Ordering::Relaxed) == accepted,
            Duration::from_secs(3)
        ));
        worker.stop();
        assert_eq!(processed.load(Ordering::Relaxed), accepted);
    }

    #[test]
    fn latest_reflects_last_accepted_submission() {
        let processed = Arc::new(AtomicU32::new(0));
        let mut worker = InferenceWorker::spawn(SlowEcho {
            delay: Duration::from_millis(20),
            processed,
        });

        let mut last_accepted = 0u8;
        for seed in 1..=20u8 {
            if worker.submit(test_frame(seed)) {
                last_accepted = seed;
            }
            thread::sleep(Duration::from_millis(5));
        }

        assert!(wait_for(
            || worker.latest() == Some(last_accepted),
            Duration::from_secs(3)
        ));
        worker.stop();
    }

    #[test]
    fn inference_error_does_not_kill_worker() {
        let mut worker = InferenceWorker::spawn(FailEveryFrame);

        assert!(worker.submit(test_frame(1)));
        // Give the failure time to happen, then confirm the loop survived.
        thread::sleep(Duration::from_millis(100));
        assert!(worker.is_running());
        assert_eq!(worker.latest(), None);

        assert!(wait_for(|| worker.submit(test_frame(2)), Duration::from_secs(1)));
        worker.stop();
    }

    #[test]
    fn quiet_cycle_keeps_previous_result() {
        let mut worker = InferenceWorker::spawn(OneShot { fired: false });

        assert!(worker.submit(test_frame(1)));
        assert!(wait_for(
            || worker.latest() == Some(9),
            Duration::from_secs(2)
        ));

        // A later frame that produces nothing must not clear the cache.
        assert!(wait_for(|| worker.submit(test_frame(2)), Duration::from_secs(1)));
        thread::sleep(Duration::from_millis(100));
        assert_eq!(worker.latest(), Some(9));
        worker.stop();
    }

    #[test]
    fn warm_up_failure_disables_worker() {
        let mut worker = InferenceWorker::spawn(FailingWarmUp);

        assert!(wait_for(|| !worker.is_running(), Duration::from_secs(2)));
        assert_eq!(worker.latest(), None);
        assert!(!worker.submit(test_frame(1)));
        // Stop on an already-dead worker is a no-op.
        worker.stop();
    }

    #[test]
    fn stop_returns_within_bound_when_idle() {
        let processed = Arc::new(AtomicU32::new(0));
        let mut worker = InferenceWorker::spawn(SlowEcho {
            delay: Duration::from_millis(0),
            processed,
        });

        // Worker is blocked on an empty input slot.
        thread::sleep(Duration::from_millis(30));

        let start = Instant::now();
        worker.stop();
        assert!(start.elapsed() < JOIN_TIMEOUT + Duration::from_millis(500));
        assert!(!worker.is_running());
    }

    #[test]
    fn stop_twice_is_safe() {
        let processed = Arc::new(AtomicU32::new(0));
        let mut worker = InferenceWorker::spawn(SlowEcho {
            delay: Duration::from_millis(0),
            processed,
        });
        worker.stop();
        worker.stop();
        assert!(!worker.is_running());
    }
}
