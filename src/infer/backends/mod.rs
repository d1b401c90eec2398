mod luminance;
mod stub;
#[cfg(feature = "backend-tract")]
mod tract;

pub use luminance::LuminanceLandmarks;
pub use stub::{StubAge, StubLandmarks};
#[cfg(feature = "backend-tract")]
pub use tract::AgeNetBackend;
