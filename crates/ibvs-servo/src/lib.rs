//! Image-based visual servoing with hybrid pose estimation.
//!
//! Per cycle, tracked pixel centroids are converted to normalized image
//! coordinates, the target pose is refined from the previous estimate to
//! provide feature depths, and the proportional law `v = -λ L⁺ e` turns the
//! stacked feature error into a camera twist:
//!
//! - [`features`]: pixel → normalized conversion and feature construction,
//! - [`pose`]: cold-start (EPnP / linear, best residual) and warm-start
//!   pose estimation refined by Levenberg-Marquardt,
//! - [`interaction`]: point interaction matrices and task stacking,
//! - [`control`]: SVD pseudo-inverse and the control law,
//! - [`servo_loop`]: the INITIALIZING / TRACKING loop over the
//!   [`FrameSource`], [`FeatureTracker`] and [`Actuator`] boundaries,
//! - [`sim`]: a simulated camera-on-robot rig implementing those boundaries.

pub mod config;
pub mod control;
pub mod error;
pub mod features;
pub mod interaction;
pub mod pose;
pub mod servo_loop;
pub mod sim;

pub use config::ServoConfig;
pub use control::{compute_control_law, pseudo_inverse, ControlOutput, ServoTask, TaskSnapshot};
pub use error::{ErrorScope, ServoError};
pub use features::{FeatureAdapter, FeaturePoint2D};
pub use interaction::{point_interaction, stack_task, InteractionSource};
pub use pose::{
    select_seed, Candidate, PoseError, PoseEstimate, PoseEstimator, PoseMode, SeedMethod,
};
pub use servo_loop::{
    Actuator, CycleRecord, FeatureTracker, FrameSource, LoopState, RunSummary, ServoLoop,
    SessionLog, StopReason, VelocityFrame,
};
