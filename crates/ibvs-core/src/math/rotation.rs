//! `Rxyz` Euler angles.
//!
//! The rotation is composed as `R = Rx(rx) · Ry(ry) · Rz(rz)`, which is the
//! convention used by the session log and the configuration files.

use crate::{Iso3, Mat3, Real, Vec3};
use nalgebra::{Rotation3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Below this magnitude both `R[1][2]` and `R[2][2]` are treated as zero
/// (gimbal lock on the Y axis) and `rx` is pinned to zero.
const GIMBAL_EPS: Real = 1e-6;

/// Euler angles (radians) in `Rx · Ry · Rz` order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rxyz {
    pub rx: Real,
    pub ry: Real,
    pub rz: Real,
}

impl Rxyz {
    pub fn new(rx: Real, ry: Real, rz: Real) -> Self {
        Self { rx, ry, rz }
    }

    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.rx, self.ry, self.rz)
    }
}

/// Build a rotation from `Rxyz` angles.
pub fn rotation_from_rxyz(r: &Rxyz) -> UnitQuaternion<Real> {
    let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), r.rx);
    let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), r.ry);
    let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), r.rz);
    UnitQuaternion::from_rotation_matrix(&(rx * ry * rz))
}

/// Extract `Rxyz` angles from a rotation.
pub fn rxyz_from_rotation(q: &UnitQuaternion<Real>) -> Rxyz {
    let r: Mat3 = q.to_rotation_matrix().into_inner();

    let rx = if r[(1, 2)].abs() < GIMBAL_EPS && r[(2, 2)].abs() < GIMBAL_EPS {
        0.0
    } else {
        (-r[(1, 2)]).atan2(r[(2, 2)])
    };
    let (s, c) = rx.sin_cos();
    let ry = r[(0, 2)].atan2(-s * r[(1, 2)] + c * r[(2, 2)]);
    let rz = (c * r[(1, 0)] + s * r[(2, 0)]).atan2(c * r[(1, 1)] + s * r[(2, 1)]);

    Rxyz { rx, ry, rz }
}

/// Build a rigid transform from a translation and `Rxyz` angles.
pub fn pose_from_translation_rxyz(t: Vec3, r: &Rxyz) -> Iso3 {
    Iso3::from_parts(Translation3::from(t), rotation_from_rxyz(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rxyz_roundtrip() {
        let angles = Rxyz::new(0.3, -0.2, 1.1);
        let q = rotation_from_rxyz(&angles);
        let back = rxyz_from_rotation(&q);
        let err = (back.as_vec3() - angles.as_vec3()).norm();
        assert!(err < 1e-12, "{back:?}");
    }

    #[test]
    fn rxyz_composition_order() {
        // A pure rotation about X must not leak into ry/rz.
        let q = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -std::f64::consts::FRAC_PI_4);
        let r = rxyz_from_rotation(&q);
        assert!((r.rx + std::f64::consts::FRAC_PI_4).abs() < 1e-12);
        assert!(r.ry.abs() < 1e-12);
        assert!(r.rz.abs() < 1e-12);
    }

    #[test]
    fn identity_has_zero_angles() {
        let r = rxyz_from_rotation(&UnitQuaternion::identity());
        assert_eq!(r.as_vec3(), Vec3::zeros());
    }
}
