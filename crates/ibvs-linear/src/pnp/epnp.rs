//! EPnP (Efficient Perspective-n-Point) solver for camera pose estimation.
//!
//! Lepetit's control-point formulation. The control points are the centroid
//! of the object points plus one point along each principal axis, scaled by
//! the standard deviation along that axis. Coplanar targets use 3 control
//! points, general 3D targets use 4.

use super::pose_utils::pose_from_points;
use super::{check_inputs, PnpError};
use crate::math::{analyze_layout, null_vector, PointLayout};
use ibvs_core::{Iso3, Pt2, Pt3, Real, Vec3};
use nalgebra::DMatrix;

/// EPnP pose estimation.
///
/// Needs 4+ points on a coplanar target and 6+ points otherwise (with fewer
/// points the linear system has more than one null direction). Returns a
/// single pose estimate in `T_C_O` form.
pub fn epnp(world: &[Pt3], image: &[Pt2]) -> Result<Iso3, PnpError> {
    check_inputs(world, image, 4)?;

    let (centroid, axes): (Vec3, Vec<(Vec3, Real)>) = match analyze_layout(world) {
        PointLayout::Degenerate => return Err(PnpError::DegeneratePoints),
        PointLayout::Planar { centroid, axes, .. } => (centroid, axes.to_vec()),
        PointLayout::General { centroid, axes } => {
            check_inputs(world, image, 6)?;
            (centroid, axes.to_vec())
        }
    };

    let mut control_w = Vec::with_capacity(axes.len() + 1);
    control_w.push(centroid);
    let mut scaled_axes = Vec::with_capacity(axes.len());
    for (axis, var) in &axes {
        let sigma = var.sqrt();
        if sigma <= Real::EPSILON {
            return Err(PnpError::DegeneratePoints);
        }
        control_w.push(centroid + axis * sigma);
        scaled_axes.push(axis / sigma);
    }
    let n_ctrl = control_w.len();

    // Barycentric coordinates; the axes are orthonormal so no inverse is needed.
    let alphas: Vec<Vec<Real>> = world
        .iter()
        .map(|p| {
            let d = p.coords - centroid;
            let coeff: Vec<Real> = scaled_axes.iter().map(|a| a.dot(&d)).collect();
            let mut alpha = Vec::with_capacity(n_ctrl);
            alpha.push(1.0 - coeff.iter().sum::<Real>());
            alpha.extend(coeff);
            alpha
        })
        .collect();

    let n = world.len();
    let mut m = DMatrix::<Real>::zeros(2 * n, 3 * n_ctrl);
    for (i, (a, uv)) in alphas.iter().zip(image.iter()).enumerate() {
        let r0 = 2 * i;
        let r1 = 2 * i + 1;
        for (j, &alpha) in a.iter().enumerate() {
            let c = 3 * j;
            m[(r0, c)] = alpha;
            m[(r0, c + 2)] = -uv.x * alpha;
            m[(r1, c + 1)] = alpha;
            m[(r1, c + 2)] = -uv.y * alpha;
        }
    }

    let sol = null_vector(&m).ok_or(PnpError::SvdFailed)?;
    let mut control_c: Vec<Vec3> = (0..n_ctrl)
        .map(|j| Vec3::new(sol[3 * j], sol[3 * j + 1], sol[3 * j + 2]))
        .collect();

    // Fix the scale from inter-control-point distances.
    let mut sum_w = 0.0;
    let mut sum_c = 0.0;
    for i in 0..n_ctrl {
        for j in (i + 1)..n_ctrl {
            sum_w += (control_w[i] - control_w[j]).norm_squared();
            sum_c += (control_c[i] - control_c[j]).norm_squared();
        }
    }
    if sum_c <= Real::EPSILON {
        return Err(PnpError::DegeneratePoints);
    }
    let mut scale = (sum_w / sum_c).sqrt();

    let depth_sum: Real = alphas
        .iter()
        .map(|a| {
            a.iter()
                .zip(&control_c)
                .map(|(&al, c)| al * c.z)
                .sum::<Real>()
        })
        .sum();
    if depth_sum < 0.0 {
        scale = -scale;
    }
    for cc in &mut control_c {
        *cc *= scale;
    }

    let camera_pts: Vec<Vec3> = alphas
        .iter()
        .map(|a| {
            a.iter()
                .zip(&control_c)
                .fold(Vec3::zeros(), |acc, (&al, c)| acc + c * al)
        })
        .collect();

    pose_from_points(world, &camera_pts)
}

#[cfg(test)]
mod tests {
    use super::super::test_scene::*;
    use super::*;
    use ibvs_core::synthetic::target;
    use ibvs_core::{pose_from_translation_rxyz, Rxyz};

    #[test]
    fn epnp_recovers_pose_of_square() {
        let gt = tilted_pose();
        let world = target::square(0.05);
        let est = epnp(&world, &project(&gt, &world)).unwrap();

        let (dt, ang) = pose_error(&est, &gt);
        assert!(dt < 1e-6, "translation error too large: {dt}");
        assert!(ang < 1e-6, "rotation error too large: {ang}");
    }

    #[test]
    fn epnp_fronto_parallel_square() {
        let gt = pose_from_translation_rxyz(Vec3::new(0.0, 0.0, 0.7), &Rxyz::default());
        let world = target::square(0.05);
        let est = epnp(&world, &project(&gt, &world)).unwrap();

        let (dt, ang) = pose_error(&est, &gt);
        assert!(dt < 1e-6 && ang < 1e-6, "dt={dt} ang={ang}");
    }

    #[test]
    fn epnp_recovers_pose_synthetic() {
        let gt = tilted_pose();
        let world = box_points();
        let est = epnp(&world, &project(&gt, &world)).unwrap();

        let (dt, ang) = pose_error(&est, &gt);
        assert!(dt < 1e-6, "translation error too large: {dt}");
        assert!(ang < 1e-6, "rotation error too large: {ang}");
    }

    #[test]
    fn epnp_needs_six_points_off_plane() {
        let gt = tilted_pose();
        let world = box_points();
        let img = project(&gt, &world);
        // Three corners of the bottom layer plus two of the top layer.
        let pick = [0usize, 3, 8, 13, 23];
        let w: Vec<Pt3> = pick.iter().map(|&i| world[i]).collect();
        let im: Vec<Pt2> = pick.iter().map(|&i| img[i]).collect();
        assert!(
            matches!(analyze_layout(&w), PointLayout::General { .. }),
            "picked points must span 3D"
        );
        assert!(matches!(
            epnp(&w, &im),
            Err(PnpError::NotEnoughPoints { needed: 6, got: 5 })
        ));
    }
}
