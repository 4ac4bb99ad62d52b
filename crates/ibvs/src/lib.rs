//! High-level entry crate for the `ibvs` toolbox.
//!
//! Image-based visual servoing of a camera mounted on a robot: tracked
//! point features are driven to a desired image configuration by the
//! proportional law `v = -λ L⁺ e`, with feature depths provided by a hybrid
//! pose estimator (closed-form EPnP / linear candidates refined by
//! Levenberg-Marquardt).
//!
//! ## Running the loop
//!
//! Implement [`servo::FrameSource`], [`servo::FeatureTracker`] and
//! [`servo::Actuator`] for your hardware (or use the [`sim`] rig), then:
//!
//! ```no_run
//! use ibvs::prelude::*;
//! use ibvs::sim::{SimRig, SimSetup};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServoConfig::default();
//! let rig = SimRig::new(SimSetup::from_config(&config, config.desired_pose(), 0.04));
//!
//! let mut servo = ServoLoop::new(
//!     &config,
//!     rig.camera(),
//!     rig.trackers(),
//!     rig.robot(),
//!     SessionLog::create("servo.log")?,
//! )?;
//! let summary = servo.run(&rig.seeds(), Some(100))?;
//! println!("{} cycles, |e| = {:?}", summary.cycles, summary.final_error_norm);
//! # Ok(())
//! # }
//! ```
//!
//! ## Using the building blocks
//!
//! ```no_run
//! use ibvs::core::synthetic::target;
//! use ibvs::core::{pose_from_translation_rxyz, Rxyz, Vec3};
//! use ibvs::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let object = target::square(0.05);
//! let pose = pose_from_translation_rxyz(Vec3::new(0.0, 0.0, 0.7), &Rxyz::default());
//! let image = target::project_normalized_all(&pose, &object)?;
//!
//! let estimator = PoseEstimator::new(Default::default());
//! let estimate = estimator.estimate_pose(&object, &image, &PoseMode::ColdStart)?;
//! let desired = ibvs::servo::features::features_from_pose(&pose, &object);
//! let current = ibvs::servo::features::current_features(&image, &estimate.pose, &object);
//!
//! let task = ServoTask::new(desired, 0.1)?;
//! let out = compute_control_law(&task.snapshot(&current)?);
//! println!("v = {:?}", out.velocity);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - **[`core`]**: math types, `Rxyz` Euler angles, camera models, synthetic data
//! - **[`linear`]**: closed-form pose (EPnP, homography decomposition, DLT)
//! - **[`optim`]**: non-linear least squares and pose refinement
//! - **[`servo`]**: features, pose estimator, interaction model, control law, loop
//! - **[`sim`]**: simulated camera-on-robot rig
//! - **[`prelude`]**: common re-exports

/// Core math types, camera models, and synthetic data helpers.
pub mod core {
    pub use ibvs_core::*;
}

/// Closed-form pose solvers.
pub mod linear {
    pub use ibvs_linear::*;
}

/// Non-linear least-squares backends and pose refinement.
pub mod optim {
    pub use ibvs_optim::*;
}

/// Servo pipeline: features, pose estimation, control law and loop.
pub mod servo {
    pub use ibvs_servo::*;
}

/// Simulated eye-in-hand rig.
pub mod sim {
    pub use ibvs_servo::sim::*;
}

/// Convenient re-exports for common use cases.
pub mod prelude {
    pub use ibvs_core::{CameraParams, Iso3, Pt2, Pt3, Real, Vec6};
    pub use ibvs_servo::{
        compute_control_law, Actuator, FeatureTracker, FrameSource, PoseEstimator, PoseMode,
        ServoConfig, ServoError, ServoLoop, ServoTask, SessionLog, VelocityFrame,
    };
}
