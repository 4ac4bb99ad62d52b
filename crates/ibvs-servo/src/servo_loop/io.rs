//! Boundary traits for the hardware the loop drives.

use crate::error::ServoError;
use ibvs_core::{Pt2, Vec6};

/// Frame in which a velocity or position is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityFrame {
    /// Camera twist `(vx, vy, vz, wx, wy, wz)`.
    Camera,
    /// Joint space.
    Articular,
}

/// Image acquisition. May block; the loop imposes no timeout.
pub trait FrameSource {
    type Frame;

    fn acquire(&mut self) -> Result<Self::Frame, ServoError>;
}

/// Tracks the centroid of one feature, in pixels.
pub trait FeatureTracker<F> {
    /// Lock onto the feature nearest to `seed`.
    fn init_track(&mut self, frame: &F, seed: Pt2) -> Result<(), ServoError>;

    /// Centroid in `frame`; fails with [`ServoError::TrackLost`].
    fn update(&mut self, frame: &F) -> Result<Pt2, ServoError>;
}

/// Robot velocity interface. Failures are [`ServoError::ActuatorFault`].
pub trait Actuator {
    fn set_velocity(&mut self, frame: VelocityFrame, velocity: &Vec6) -> Result<(), ServoError>;

    fn get_velocity(&mut self, frame: VelocityFrame) -> Result<Vec6, ServoError>;

    fn get_position(&mut self, frame: VelocityFrame) -> Result<Vec6, ServoError>;
}
