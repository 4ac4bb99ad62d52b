//! Direct Linear Transform (DLT) solver for camera pose estimation.
//!
//! Provides a linear least-squares solution to the PnP problem using
//! homogeneous equations on normalized image coordinates. The rotation
//! block is projected onto SO(3) via SVD.

use super::{check_inputs, PnpError};
use crate::math::{analyze_layout, mat34_from_vec, null_vector, project_to_so3, PointLayout};
use ibvs_core::{Iso3, Mat4, Pt2, Pt3, Real};
use nalgebra::{DMatrix, Translation3};

/// Direct linear PnP on 6+ non-coplanar points.
///
/// Object points are Hartley-normalized (centroid at the origin, mean
/// distance `√3`) before building the `2n x 12` system.
///
/// Returns `T_C_O`: the transform from object to camera coordinates.
pub fn dlt(world: &[Pt3], image: &[Pt2]) -> Result<Iso3, PnpError> {
    check_inputs(world, image, 6)?;
    match analyze_layout(world) {
        PointLayout::Degenerate => return Err(PnpError::DegeneratePoints),
        PointLayout::Planar { .. } => return Err(PnpError::PlanarPoints),
        PointLayout::General { .. } => {}
    }

    let n = world.len();
    let n_real = n as Real;
    let sum = world
        .iter()
        .fold(ibvs_core::Vec3::zeros(), |acc, p| acc + p.coords);
    let centroid = sum / n_real;
    let mean_dist = world
        .iter()
        .map(|p| (p.coords - centroid).norm())
        .sum::<Real>()
        / n_real;
    if mean_dist <= Real::EPSILON {
        return Err(PnpError::DegeneratePoints);
    }

    let scale = (3.0_f64).sqrt() / mean_dist;
    let t_world = Mat4::new(
        scale,
        0.0,
        0.0,
        -scale * centroid.x,
        0.0,
        scale,
        0.0,
        -scale * centroid.y,
        0.0,
        0.0,
        scale,
        -scale * centroid.z,
        0.0,
        0.0,
        0.0,
        1.0,
    );

    // Build 2n x 12 DLT matrix for P = [R | t] in normalized image coords.
    let mut a = DMatrix::<Real>::zeros(2 * n, 12);

    for (i, (pw, pi)) in world.iter().zip(image.iter()).enumerate() {
        let d = (pw.coords - centroid) * scale;
        let (x, y, z) = (d.x, d.y, d.z);
        let u = pi.x;
        let v = pi.y;

        let r0 = 2 * i;
        let r1 = 2 * i + 1;

        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = z;
        a[(r0, 3)] = 1.0;
        a[(r0, 8)] = -u * x;
        a[(r0, 9)] = -u * y;
        a[(r0, 10)] = -u * z;
        a[(r0, 11)] = -u;

        a[(r1, 4)] = x;
        a[(r1, 5)] = y;
        a[(r1, 6)] = z;
        a[(r1, 7)] = 1.0;
        a[(r1, 8)] = -v * x;
        a[(r1, 9)] = -v * y;
        a[(r1, 10)] = -v * z;
        a[(r1, 11)] = -v;
    }

    let p_vec = null_vector(&a).ok_or(PnpError::SvdFailed)?;
    // De-normalize object points: P = P_norm * T_world.
    let p_mtx = mat34_from_vec(&p_vec) * t_world;

    let mut r_approx = p_mtx.fixed_view::<3, 3>(0, 0).into_owned();

    // Remove the unknown scale (average row norm), sign chosen so det(R) > 0.
    let mut s = (r_approx.row(0).norm() + r_approx.row(1).norm() + r_approx.row(2).norm()) / 3.0;
    if r_approx.determinant() < 0.0 {
        s = -s;
    }
    if s.abs() <= Real::EPSILON {
        return Err(PnpError::DegeneratePoints);
    }
    r_approx /= s;

    let rot = project_to_so3(&r_approx).ok_or(PnpError::SvdFailed)?;
    let t = p_mtx.column(3).into_owned() / s;

    Ok(Iso3::from_parts(Translation3::from(t), rot))
}
