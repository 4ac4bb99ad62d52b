//! Core math and geometry primitives for the `ibvs` toolbox.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec2`, `Vec6`, `Pt3`, ...),
//! - `Rxyz` Euler-angle conversions used by pose telemetry,
//! - the pinhole camera model with distortion and intrinsics stages,
//! - deterministic synthetic data helpers for tests and simulation.
//!
//! Camera pipeline:
//! `pixel = K ∘ distortion ∘ pinhole(p_c)`

/// Linear algebra type aliases and helpers.
pub mod math;
/// Camera models and distortion utilities.
pub mod models;
/// Deterministic synthetic targets, poses and noise.
pub mod synthetic;

pub use math::*;
pub use models::*;
