//! The frame pipeline.
//!
//! Everything here is about moving frames between threads without blocking
//! and without unbounded buffering:
//!
//! - `slot`: capacity-1 handoff between the render loop and a worker
//! - `cache`: single-writer latest-value cache workers publish into
//! - `worker`: background inference worker built from the two
//! - `stream`: capture thread publishing the newest frame
//! - `orchestrator`: the single-threaded render loop tying it together

pub mod cache;
pub mod orchestrator;
pub mod slot;
pub mod stream;
pub mod worker;

pub use cache::{result_cache, ResultReader, ResultWriter};
pub use orchestrator::{Orchestrator, StopReason, Tick};
pub use slot::{HandoffSlot, OverflowPolicy};
pub use stream::FrameStream;
pub use worker::InferenceWorker;
