//! Planar targets and their projections.

use crate::{
    models::{DistortionModel, IntrinsicsModel},
    project_normalized, Camera, Iso3, Pt2, Pt3, Real, Vec2, Vec3,
};
use anyhow::Result;
use nalgebra::{Translation3, UnitQuaternion};

/// Corners of a square of half-width `half_width` on the plane `Z = 0`.
///
/// The order is clockwise in the image when viewed from a camera looking
/// down +Z at the target: `(-L,-L)`, `(L,-L)`, `(L,L)`, `(-L,L)`.
pub fn square(half_width: Real) -> Vec<Pt3> {
    let l = half_width;
    vec![
        Pt3::new(-l, -l, 0.0),
        Pt3::new(l, -l, 0.0),
        Pt3::new(l, l, 0.0),
        Pt3::new(-l, l, 0.0),
    ]
}

/// Generate a planar grid of 3D points (Z=0) with `nx * ny` points, centered
/// on the origin.
///
/// Points are ordered deterministically in row-major order (Y major).
pub fn centered_grid(nx: usize, ny: usize, spacing: Real) -> Vec<Pt3> {
    let ox = 0.5 * spacing * nx.saturating_sub(1) as Real;
    let oy = 0.5 * spacing * ny.saturating_sub(1) as Real;
    let mut points = Vec::with_capacity(nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            points.push(Pt3::new(
                i as Real * spacing - ox,
                j as Real * spacing - oy,
                0.0,
            ));
        }
    }
    points
}

/// Apply a small rigid offset to a pose: translation `dt` (meters) and
/// rotation vector `drot` (axis * angle, radians), both in the camera frame.
pub fn perturb_pose(pose: &Iso3, dt: Vec3, drot: Vec3) -> Iso3 {
    let delta = Iso3::from_parts(
        Translation3::from(dt),
        UnitQuaternion::from_scaled_axis(drot),
    );
    delta * pose
}

/// Project target points into normalized image coordinates, requiring every
/// point to be in front of the camera.
///
/// `cam_from_target` must map target-frame points into the camera frame.
pub fn project_normalized_all(cam_from_target: &Iso3, target_points: &[Pt3]) -> Result<Vec<Pt2>> {
    let mut out = Vec::with_capacity(target_points.len());
    for (idx, pw) in target_points.iter().enumerate() {
        let pc = cam_from_target.transform_point(pw);
        let Some(n) = project_normalized(&pc) else {
            anyhow::bail!("point {idx} not projectable (z={:.6})", pc.z);
        };
        out.push(n);
    }
    Ok(out)
}

/// Project target points into pixel coordinates, requiring every point to
/// be projectable.
pub fn project_pixels_all<D, K>(
    camera: &Camera<Real, D, K>,
    cam_from_target: &Iso3,
    target_points: &[Pt3],
) -> Result<Vec<Vec2>>
where
    D: DistortionModel<Real>,
    K: IntrinsicsModel<Real>,
{
    let mut pixels = Vec::with_capacity(target_points.len());
    for (idx, pw) in target_points.iter().enumerate() {
        let pc = cam_from_target.transform_point(pw);
        let Some(uv) = camera.project_point(&pc) else {
            anyhow::bail!("point {idx} not projectable (z={:.6})", pc.z);
        };
        pixels.push(uv);
    }
    Ok(pixels)
}
