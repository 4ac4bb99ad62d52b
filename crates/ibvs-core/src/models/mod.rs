//! Pinhole camera model with pluggable lens and pixel stages.
//!
//! 1. Pinhole projection: camera-frame point to normalized `(x/z, y/z)`.
//! 2. `DistortionModel`: radial/tangential distortion in normalized space.
//! 3. `IntrinsicsModel`: distorted normalized coordinates to pixels (K).
//!
//! The inverse chain is what the feature adapter uses to turn tracked
//! centroids into the normalized coordinates consumed by the control law.

mod camera;
mod distortion;
mod intrinsics;
mod params;

pub use camera::*;
pub use distortion::*;
pub use intrinsics::*;
pub use params::*;
