//! Mathematical utilities and type definitions.
//!
//! This module provides fundamental types used throughout the workspace
//! and helpers for homogeneous coordinates and rigid transforms.

use nalgebra::{Isometry3, Matrix3, Matrix4, Point2, Point3, Vector2, Vector3, Vector6};

pub mod rotation;

pub use rotation::{pose_from_translation_rxyz, rotation_from_rxyz, rxyz_from_rotation, Rxyz};

/// Scalar type used throughout the workspace (currently `f64`).
pub type Real = f64;

/// 2D vector with [`Real`] components.
pub type Vec2 = Vector2<Real>;
/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 6D vector with [`Real`] components (camera twists, joint states).
pub type Vec6 = Vector6<Real>;
/// 2D point with [`Real`] coordinates.
pub type Pt2 = Point2<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 4×4 matrix with [`Real`] entries.
pub type Mat4 = Matrix4<Real>;
/// 3D rigid transform (SE(3)) using [`Real`].
pub type Iso3 = Isometry3<Real>;

/// Convert a 2D point in Euclidean coordinates into homogeneous coordinates.
///
/// Given a point `p = (x, y)`, returns the homogeneous vector `(x, y, 1)`.
pub fn to_homogeneous(p: &Pt2) -> Vec3 {
    Vec3::new(p.x, p.y, 1.0)
}

/// Convert a 3D homogeneous vector back to a 2D point.
///
/// The input is interpreted as `(x, y, w)` and the result is `(x / w, y / w)`.
/// The caller is responsible for ensuring that `w != 0`.
pub fn from_homogeneous(v: &Vec3) -> Pt2 {
    Pt2::new(v.x / v.z, v.y / v.z)
}

/// Project a camera-frame point onto the normalized image plane (`Z = 1`).
///
/// Returns `None` for points on or behind the camera plane.
pub fn project_normalized(p_c: &Pt3) -> Option<Pt2> {
    if p_c.z <= 0.0 {
        return None;
    }
    Some(Pt2::new(p_c.x / p_c.z, p_c.y / p_c.z))
}

/// Rotation angle (radians) between two rigid transforms.
///
/// Evaluated as `2·atan2(|v|, |w|)` on the relative quaternion, which stays
/// accurate for tiny angles where `acos` of the trace does not.
pub fn rotation_distance(a: &Iso3, b: &Iso3) -> Real {
    let q = (a.rotation.inverse() * b.rotation).into_inner();
    2.0 * q.vector().norm().atan2(q.scalar().abs())
}

/// Euclidean distance between the translations of two rigid transforms.
pub fn translation_distance(a: &Iso3, b: &Iso3) -> Real {
    (a.translation.vector - b.translation.vector).norm()
}
