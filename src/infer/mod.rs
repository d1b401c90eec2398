//! Inference collaborators.
//!
//! The pipeline treats inference as an opaque capability: frames go in,
//! cloneable results come out. `backend` defines the contract, `landmarks`
//! and `age` the result vocabularies, and `backends` the implementations
//! (heuristic, stub, and ONNX via the `backend-tract` feature).

pub mod age;
mod backend;
pub mod backends;
pub mod landmarks;

pub use age::{estimate_from_scores, AgeEstimate, AGE_BUCKETS, DEFAULT_CONFIDENCE_THRESHOLD};
pub use backend::InferenceBackend;
#[cfg(feature = "backend-tract")]
pub use backends::AgeNetBackend;
pub use backends::{LuminanceLandmarks, StubAge, StubLandmarks};
pub use landmarks::{face_bounding_box, Landmark, LandmarkResult};
