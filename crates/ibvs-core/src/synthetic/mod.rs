//! Deterministic synthetic data generation helpers.
//!
//! Small building blocks for constructing synthetic servoing scenes used in
//! tests, the simulator and the examples:
//! - planar square targets and point grids,
//! - pose perturbation helpers,
//! - projection helpers (normalized and pixel coordinates),
//! - deterministic pseudo-random noise.
//!
//! # Example
//!
//! ```no_run
//! use ibvs_core::{synthetic::target, CameraParams, Iso3};
//!
//! let cam = CameraParams::default().build();
//! let square = target::square(0.05);
//! let pose = Iso3::translation(0.0, 0.0, 0.7);
//! let pixels = target::project_pixels_all(&cam, &pose, &square).unwrap();
//! assert_eq!(pixels.len(), 4);
//! ```

pub mod noise;
pub mod target;
