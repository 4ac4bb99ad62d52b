//! Simulated Cartesian robot carrying the camera (eye-in-hand).

use super::SharedWorld;
use crate::error::ServoError;
use crate::servo_loop::{Actuator, VelocityFrame};
use ibvs_core::{rxyz_from_rotation, Iso3, Mat3, Real, Vec3, Vec6};
use nalgebra::{Translation3, UnitQuaternion};

/// SE(3) exponential of the twist `(v, ω)` applied for `dt` seconds.
pub fn twist_exp(twist: &Vec6, dt: Real) -> Iso3 {
    let v = Vec3::new(twist[0], twist[1], twist[2]) * dt;
    let w = Vec3::new(twist[3], twist[4], twist[5]) * dt;
    let theta = w.norm();
    let wx = w.cross_matrix();

    let left_jacobian = if theta < 1e-9 {
        Mat3::identity() + wx * 0.5
    } else {
        let t2 = theta * theta;
        Mat3::identity()
            + wx * ((1.0 - theta.cos()) / t2)
            + wx * wx * ((theta - theta.sin()) / (t2 * theta))
    };

    Iso3::from_parts(
        Translation3::from(left_jacobian * v),
        UnitQuaternion::from_scaled_axis(w),
    )
}

/// `[t, rxyz]` of a pose.
pub(super) fn pose_vector(pose: &Iso3) -> Vec6 {
    let t = pose.translation.vector;
    let r = rxyz_from_rotation(&pose.rotation);
    Vec6::new(t.x, t.y, t.z, r.rx, r.ry, r.rz)
}

/// Joints are the camera pose in the object (base) frame; joint velocities
/// are the camera twist expressed in that frame.
#[derive(Debug, Clone)]
pub struct SimRobot {
    pub(super) world: SharedWorld,
}

impl SimRobot {
    /// Last commanded camera twist.
    pub fn last_twist(&self) -> Vec6 {
        self.world.borrow().last_twist
    }

    /// Number of accepted velocity commands.
    pub fn commands(&self) -> usize {
        self.world.borrow().commands
    }
}

impl Actuator for SimRobot {
    fn set_velocity(&mut self, frame: VelocityFrame, velocity: &Vec6) -> Result<(), ServoError> {
        let mut w = self.world.borrow_mut();
        if frame != VelocityFrame::Camera {
            return Err(ServoError::ActuatorFault(format!(
                "velocity control in {frame:?} frame is not supported"
            )));
        }
        if w.actuator_fault_after.is_some_and(|n| w.commands >= n) {
            return Err(ServoError::ActuatorFault("simulated drive fault".into()));
        }
        if !velocity.iter().all(|v| v.is_finite()) {
            let msg = "non-finite velocity command";
            return Err(ServoError::ActuatorFault(msg.into()));
        }

        let base_rot = w.cam_from_object.rotation.inverse();
        let lin = base_rot * Vec3::new(velocity[0], velocity[1], velocity[2]);
        let ang = base_rot * Vec3::new(velocity[3], velocity[4], velocity[5]);
        w.joint_velocity = Vec6::new(lin.x, lin.y, lin.z, ang.x, ang.y, ang.z);

        let motion = twist_exp(velocity, w.dt);
        w.cam_from_object = motion.inverse() * w.cam_from_object;
        w.last_twist = *velocity;
        w.commands += 1;
        Ok(())
    }

    fn get_velocity(&mut self, frame: VelocityFrame) -> Result<Vec6, ServoError> {
        let w = self.world.borrow();
        Ok(match frame {
            VelocityFrame::Camera => w.last_twist,
            VelocityFrame::Articular => w.joint_velocity,
        })
    }

    fn get_position(&mut self, _frame: VelocityFrame) -> Result<Vec6, ServoError> {
        // Cartesian robot: joint and camera positions coincide.
        Ok(pose_vector(&self.world.borrow().cam_from_object.inverse()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exp_of_pure_translation() {
        let m = twist_exp(&Vec6::new(0.1, -0.2, 0.3, 0.0, 0.0, 0.0), 0.5);
        let expected = Vec3::new(0.05, -0.1, 0.15);
        assert!((m.translation.vector - expected).norm() < 1e-15);
        assert_eq!(m.rotation, UnitQuaternion::identity());
    }

    #[test]
    fn exp_of_screw_motion() {
        // Rotation about z with tangential velocity traces a circle of radius r.
        let r = 0.2;
        let omega = 1.0;
        let twist = Vec6::new(r * omega, 0.0, 0.0, 0.0, 0.0, omega);
        let m = twist_exp(&twist, std::f64::consts::PI);
        // Half a turn: displaced by the diameter along y.
        let expected = Vec3::new(0.0, 2.0 * r, 0.0);
        assert!((m.translation.vector - expected).norm() < 1e-12);
        assert!((m.rotation.angle() - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn small_angle_branch_is_continuous() {
        let tw = Vec6::new(0.1, 0.0, 0.0, 0.0, 0.0, 1e-10);
        let a = twist_exp(&tw, 1.0);
        let expected = Vec3::new(0.1, 0.0, 0.0);
        assert!((a.translation.vector - expected).norm() < 1e-10);
    }
}
