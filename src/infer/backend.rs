use anyhow::Result;

use crate::frame::Frame;

/// Inference backend trait.
///
/// A backend wraps one opaque inference capability (a landmark model, an age
/// classifier). The pipeline never inspects what a backend computes; it only
/// moves frames in and cached results out.
///
/// Backends are `Send` but not `Sync`: each one is owned by exactly one
/// worker thread for its whole lifetime. Heavyweight state (a loaded model)
/// belongs in `warm_up`, which the worker calls once on its own thread before
/// the first frame, never per frame.
pub trait InferenceBackend: Send {
    /// What the backend produces. Cloned into the result cache.
    type Output: Clone + Send + 'static;

    /// Backend identifier, used in log lines.
    fn name(&self) -> &'static str;

    /// One-time heavyweight initialization, run on the worker thread.
    ///
    /// An error here disables the worker: it logs, stops, and the pipeline
    /// degrades to running without this result kind.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }

    /// Run inference on one frame.
    ///
    /// Synchronous and potentially slow. `Ok(None)` means the backend has
    /// nothing confident to report for this frame; whatever was published
    /// before stays current. An error skips this frame's result and must
    /// leave the backend usable for the next frame.
    fn infer(&mut self, frame: &Frame) -> Result<Option<Self::Output>>;
}
