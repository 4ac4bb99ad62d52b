//! Non-linear least squares on top of the `levenberg-marquardt` crate.
//!
//! Problems implement [`NllsProblem`] (dense residuals and Jacobian) and are
//! handed to a [`NllsSolverBackend`]. The only problem shipped here is
//! reprojection-error refinement of a single camera pose.

pub mod backend_lm;
pub mod pose_refine;
mod traits;

pub use backend_lm::LmBackend;
pub use pose_refine::{
    mean_reprojection_residual, refine_pose, PoseRefineProblem, PoseRefinement, RefineOptions,
};
pub use traits::{NllsProblem, NllsSolverBackend, SolveOptions, SolveReport};
