//! Simulated eye-in-hand rig: a camera on a Cartesian robot looking at a
//! static target.
//!
//! The camera, trackers and robot share one world state, so commanded
//! twists move the camera and the next frame reflects the motion.
//!
//! ```no_run
//! use ibvs_servo::sim::{SimRig, SimSetup};
//! use ibvs_servo::{ServoConfig, ServoLoop, SessionLog};
//!
//! let config = ServoConfig::default();
//! let rig = SimRig::new(SimSetup::from_config(&config, config.desired_pose(), 0.04));
//! let mut servo = ServoLoop::new(
//!     &config,
//!     rig.camera(),
//!     rig.trackers(),
//!     rig.robot(),
//!     SessionLog::new(Vec::new()),
//! )?;
//! let summary = servo.run(&rig.seeds(), Some(10))?;
//! assert_eq!(summary.cycles, 10);
//! # Ok::<(), ibvs_servo::ServoError>(())
//! ```

mod camera;
mod robot;

pub use camera::{SimCamera, SimFrame, SimTracker};
pub use robot::{twist_exp, SimRobot};

use crate::config::ServoConfig;
use ibvs_core::synthetic::noise::FrameJitter;
use ibvs_core::{CameraModel, CameraParams, Iso3, Pt2, Pt3, Real, Vec2, Vec6};
use std::cell::RefCell;
use std::rc::Rc;

type SharedWorld = Rc<RefCell<SimWorld>>;

/// Rig description.
#[derive(Debug, Clone)]
pub struct SimSetup {
    pub camera: CameraParams,
    /// Image width and height in pixels; centroids outside are not visible.
    pub image_size: (Real, Real),
    pub object: Vec<Pt3>,
    /// Initial `T_C_O`.
    pub start_pose: Iso3,
    /// Control period, seconds.
    pub dt: Real,
    /// Centroid noise, pixels.
    pub noise: Option<FrameJitter>,
}

impl SimSetup {
    pub fn from_config(config: &ServoConfig, start_pose: Iso3, dt: Real) -> Self {
        Self {
            camera: config.camera.clone(),
            image_size: (640.0, 480.0),
            object: config.object_points(),
            start_pose,
            dt,
            noise: None,
        }
    }

    pub fn with_noise(mut self, noise: FrameJitter) -> Self {
        self.noise = Some(noise);
        self
    }
}

#[derive(Debug)]
struct SimWorld {
    camera: CameraModel,
    image_size: (Real, Real),
    object: Vec<Pt3>,
    cam_from_object: Iso3,
    dt: Real,
    noise: Option<FrameJitter>,
    pixel_offsets: Vec<Vec2>,
    hidden: Vec<usize>,
    frames: usize,
    last_twist: Vec6,
    joint_velocity: Vec6,
    commands: usize,
    actuator_fault_after: Option<usize>,
}

/// Handle on the simulated world, used to build the loop's endpoints and to
/// script disturbances between cycles.
#[derive(Debug, Clone)]
pub struct SimRig {
    world: SharedWorld,
}

impl SimRig {
    pub fn new(setup: SimSetup) -> Self {
        let world = SimWorld {
            camera: setup.camera.build(),
            image_size: setup.image_size,
            object: setup.object,
            cam_from_object: setup.start_pose,
            dt: setup.dt,
            noise: setup.noise,
            pixel_offsets: Vec::new(),
            hidden: Vec::new(),
            frames: 0,
            last_twist: Vec6::zeros(),
            joint_velocity: Vec6::zeros(),
            commands: 0,
            actuator_fault_after: None,
        };
        Self {
            world: Rc::new(RefCell::new(world)),
        }
    }

    pub fn camera(&self) -> SimCamera {
        SimCamera {
            world: Rc::clone(&self.world),
        }
    }

    pub fn robot(&self) -> SimRobot {
        SimRobot {
            world: Rc::clone(&self.world),
        }
    }

    /// One tracker per object point.
    pub fn trackers(&self) -> Vec<SimTracker> {
        (0..self.world.borrow().object.len())
            .map(SimTracker::new)
            .collect()
    }

    /// Noise-free pixel positions of the object points at the current pose,
    /// standing in for operator clicks. Points behind the camera map to NaN.
    pub fn seeds(&self) -> Vec<Pt2> {
        let w = self.world.borrow();
        w.object
            .iter()
            .map(|p| {
                w.camera
                    .project_point(&w.cam_from_object.transform_point(p))
                    .map(Pt2::from)
                    .unwrap_or_else(|| Pt2::new(Real::NAN, Real::NAN))
            })
            .collect()
    }

    /// True `T_C_O`.
    pub fn true_pose(&self) -> Iso3 {
        self.world.borrow().cam_from_object
    }

    /// Move the camera by `delta` (expressed in the camera frame), as an
    /// external push would.
    pub fn disturb(&self, delta: &Iso3) {
        let mut w = self.world.borrow_mut();
        w.cam_from_object = delta * w.cam_from_object;
    }

    /// Add a per-point pixel offset to every following frame; an empty
    /// slice removes it.
    pub fn set_pixel_offsets(&self, offsets: &[Vec2]) {
        self.world.borrow_mut().pixel_offsets = offsets.to_vec();
    }

    /// Make point `index` invisible from the next frame on.
    pub fn hide_point(&self, index: usize) {
        self.world.borrow_mut().hidden.push(index);
    }

    /// Fail every velocity command after `n` accepted ones.
    pub fn fail_actuator_after(&self, n: usize) {
        self.world.borrow_mut().actuator_fault_after = Some(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::servo_loop::{Actuator, FeatureTracker, FrameSource, VelocityFrame};
    use ibvs_core::{rotation_distance, translation_distance};

    fn rig() -> SimRig {
        let config = ServoConfig::default();
        SimRig::new(SimSetup::from_config(&config, config.desired_pose(), 0.1))
    }

    #[test]
    fn frames_show_the_square() {
        let rig = rig();
        let frame = rig.camera().acquire().unwrap();
        assert_eq!(frame.index, 0);
        let seeds = rig.seeds();
        for (c, s) in frame.centroids.iter().zip(&seeds) {
            assert_eq!(c.unwrap(), *s);
        }
        // 600 * 0.05 / 0.7 px around the principal point.
        assert!((seeds[2].x - (320.0 + 600.0 * 0.05 / 0.7)).abs() < 1e-9);
    }

    #[test]
    fn zero_twist_keeps_the_pose() {
        let rig = rig();
        let mut robot = rig.robot();
        let before = rig.true_pose();
        robot
            .set_velocity(VelocityFrame::Camera, &Vec6::zeros())
            .unwrap();
        assert!(translation_distance(&before, &rig.true_pose()) < 1e-15);
        assert_eq!(robot.commands(), 1);
    }

    #[test]
    fn forward_twist_reduces_depth() {
        let rig = rig();
        let mut robot = rig.robot();
        let twist = Vec6::new(0.0, 0.0, 0.1, 0.0, 0.0, 0.0);
        robot.set_velocity(VelocityFrame::Camera, &twist).unwrap();
        // dt = 0.1 s at 0.1 m/s.
        assert!((rig.true_pose().translation.z - 0.69).abs() < 1e-12);
        let desired = ServoConfig::default().desired_pose();
        assert!(rotation_distance(&rig.true_pose(), &desired) < 1e-15);

        let q = robot.get_position(VelocityFrame::Articular).unwrap();
        let z = q[2];
        assert!((z + 0.69).abs() < 1e-12, "camera z in target frame: {z}");
        let qd = robot.get_velocity(VelocityFrame::Articular).unwrap();
        assert!((qd - twist).norm() < 1e-15);
    }

    #[test]
    fn rejects_articular_commands_and_injected_faults() {
        let rig = rig();
        let mut robot = rig.robot();
        assert!(robot
            .set_velocity(VelocityFrame::Articular, &Vec6::zeros())
            .is_err());
        rig.fail_actuator_after(0);
        assert!(matches!(
            robot.set_velocity(VelocityFrame::Camera, &Vec6::zeros()),
            Err(crate::ServoError::ActuatorFault(_))
        ));
    }

    #[test]
    fn tracker_follows_and_loses_points() {
        let rig = rig();
        let mut cam = rig.camera();
        let seeds = rig.seeds();
        let mut tracker = SimTracker::new(1);

        let frame = cam.acquire().unwrap();
        let nearby = seeds[1] + Vec2::new(3.0, -2.0);
        tracker.init_track(&frame, nearby).unwrap();
        assert_eq!(tracker.update(&frame).unwrap(), seeds[1]);

        rig.disturb(&Iso3::translation(0.001, 0.0, 0.0));
        let moved = tracker.update(&cam.acquire().unwrap()).unwrap();
        assert!((moved - seeds[1]).norm() > 0.5);

        rig.hide_point(1);
        assert!(matches!(
            tracker.update(&cam.acquire().unwrap()),
            Err(crate::ServoError::TrackLost { index: 1 })
        ));
    }

    #[test]
    fn tracker_needs_a_nearby_centroid() {
        let rig = rig();
        let frame = rig.camera().acquire().unwrap();
        let mut tracker = SimTracker::new(0);
        assert!(tracker.init_track(&frame, Pt2::new(5.0, 5.0)).is_err());
    }
}
