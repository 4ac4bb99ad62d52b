//! Closed-form (non-iterative) pose solvers.
//!
//! Every solver here works in **normalized image coordinates**: the caller
//! is responsible for removing intrinsics and lens distortion first. All
//! poses are returned as `T_C_O`, mapping object-frame points into the
//! camera frame.
//!
//! - [`epnp`]: control-point formulation, planar (3 control points) and
//!   general (4 control points) configurations.
//! - [`linear_pose`]: plane-induced homography decomposition for coplanar
//!   targets and a normalized DLT of `[R | t]` otherwise.
//! - [`analyze_layout`]: collinearity/planarity classification shared by
//!   both solvers.

pub mod homography;
pub mod math;
pub mod pnp;

pub use homography::{dlt_homography, HomographyError};
pub use math::{analyze_layout, PointLayout};
pub use pnp::{dlt, epnp, linear_pose, planar_homography_pose, PnpError, PnpSolver};
