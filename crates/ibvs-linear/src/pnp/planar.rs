//! Pose of a coplanar target from its plane-induced homography.

use super::{check_inputs, PnpError};
use crate::homography::dlt_homography;
use crate::math::{analyze_layout, project_to_so3, PointLayout};
use ibvs_core::{Iso3, Mat3, Pt2, Pt3, Real};

/// Pose of a coplanar target (4+ points, any plane in the object frame).
///
/// Object points are expressed in a plane-aligned frame, the homography
/// plane → normalized image is estimated by DLT, and `H ~ [r1 r2 t]` is
/// decomposed with the rotation projected onto SO(3).
pub fn planar_homography_pose(world: &[Pt3], image: &[Pt2]) -> Result<Iso3, PnpError> {
    check_inputs(world, image, 4)?;
    match analyze_layout(world) {
        PointLayout::Planar {
            object_from_plane, ..
        } => planar_homography_pose_in_frame(world, image, &object_from_plane),
        PointLayout::Degenerate => Err(PnpError::DegeneratePoints),
        PointLayout::General { .. } => Err(PnpError::NonPlanarPoints),
    }
}

pub(super) fn planar_homography_pose_in_frame(
    world: &[Pt3],
    image: &[Pt2],
    object_from_plane: &Iso3,
) -> Result<Iso3, PnpError> {
    let plane: Vec<Pt2> = world
        .iter()
        .map(|p| {
            let q = object_from_plane.inverse_transform_point(p);
            Pt2::new(q.x, q.y)
        })
        .collect();

    let h = dlt_homography(&plane, image)?;
    let cam_from_plane = decompose_planar_homography(&h)?;
    Ok(cam_from_plane * object_from_plane.inverse())
}

/// Decompose `H ~ [r1 r2 t]` (intrinsics already removed) into `T_C_P`.
fn decompose_planar_homography(h: &Mat3) -> Result<Iso3, PnpError> {
    let h1 = h.column(0).into_owned();
    let h2 = h.column(1).into_owned();
    let h3 = h.column(2).into_owned();

    // Scale factor: average of the first two column norms.
    let norm = 0.5 * (h1.norm() + h2.norm());
    if norm <= Real::EPSILON {
        return Err(PnpError::DegeneratePoints);
    }
    let mut lambda = 1.0 / norm;
    // The plane origin must lie in front of the camera.
    if lambda * h3.z < 0.0 {
        lambda = -lambda;
    }

    let r1 = h1 * lambda;
    let r2 = h2 * lambda;
    let r3 = r1.cross(&r2);
    let rot = project_to_so3(&Mat3::from_columns(&[r1, r2, r3]))
        .ok_or(PnpError::SvdFailed)?;
    let t = h3 * lambda;

    Ok(Iso3::from_parts(t.into(), rot))
}
