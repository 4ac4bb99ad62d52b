//! Shared numerics for the closed-form solvers.
//!
//! - **Hartley normalization** of 2D points (conditioning for DLT systems),
//! - **null-space extraction** of homogeneous systems `A x = 0`,
//! - **point layout analysis** (degenerate / planar / general) from the
//!   eigen decomposition of the object-point covariance.

use ibvs_core::{Iso3, Mat3, Pt2, Pt3, Real, Vec3};
use nalgebra::{linalg::SymmetricEigen, DMatrix, DVector, Matrix3x4, Rotation3, UnitQuaternion};

/// Relative eigenvalue threshold below which the second principal axis is
/// considered absent (all points on a line or at one location).
pub const COLLINEAR_EPS: Real = 1e-10;
/// Relative eigenvalue threshold below which the third principal axis is
/// considered absent (all points on a plane).
pub const PLANAR_EPS: Real = 1e-8;

/// Hartley normalization for 2D points.
///
/// Centers points at the origin and scales so that the mean distance from
/// the origin is `√2`. Returns the normalized points and the 3x3 transform
/// `T` with `p_norm = T * p_homogeneous`, or `None` when the input is empty
/// or all points coincide.
pub fn normalize_points_2d(points: &[Pt2]) -> Option<(Vec<Pt2>, Mat3)> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as Real;
    let sum = points
        .iter()
        .fold(nalgebra::Vector2::zeros(), |acc, p| acc + p.coords);
    let centroid = sum / n;
    let mean_dist = points
        .iter()
        .map(|p| (p.coords - centroid).norm())
        .sum::<Real>()
        / n;

    if mean_dist <= Real::EPSILON {
        return None;
    }

    let scale = (2.0_f64).sqrt() / mean_dist;
    let t = Mat3::new(
        scale,
        0.0,
        -scale * centroid.x,
        0.0,
        scale,
        -scale * centroid.y,
        0.0,
        0.0,
        1.0,
    );

    let norm = points
        .iter()
        .map(|p| Pt2::from((p.coords - centroid) * scale))
        .collect();

    Some((norm, t))
}

/// Unit vector spanning the (approximate) null space of `a`.
///
/// Returns the right singular vector of the smallest singular value. Wide
/// systems are padded with zero rows first so that the full right singular
/// basis is available.
pub fn null_vector(a: &DMatrix<Real>) -> Option<DVector<Real>> {
    let ncols = a.ncols();
    if ncols == 0 {
        return None;
    }

    let padded;
    let a = if a.nrows() < ncols {
        padded = a.clone().resize_vertically(ncols, 0.0);
        &padded
    } else {
        a
    };

    let svd = a.clone().svd(false, true);
    let v_t = svd.v_t?;
    let (min_idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|x, y| x.1.total_cmp(y.1))?;
    Some(v_t.row(min_idx).transpose())
}

/// Reshape a 12-vector (row-major) into a 3x4 matrix.
pub fn mat34_from_vec(v: &DVector<Real>) -> Matrix3x4<Real> {
    debug_assert_eq!(v.len(), 12, "expected 12 entries for a 3x4 matrix");
    let mut m = Matrix3x4::<Real>::zeros();
    for r in 0..3 {
        for c in 0..4 {
            m[(r, c)] = v[4 * r + c];
        }
    }
    m
}

/// Project an approximate rotation onto SO(3) (polar decomposition via SVD).
pub fn project_to_so3(m: &Mat3) -> Option<UnitQuaternion<Real>> {
    let svd = m.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_flipped = u;
        u_flipped.column_mut(2).neg_mut();
        r = u_flipped * v_t;
    }
    Some(UnitQuaternion::from_rotation_matrix(
        &Rotation3::from_matrix_unchecked(r),
    ))
}

/// Geometric layout of a set of object points.
#[derive(Debug, Clone)]
pub enum PointLayout {
    /// Fewer than two independent directions: coincident or collinear points.
    Degenerate,
    /// All points on one plane. `object_from_plane` maps plane coordinates
    /// `(u, v, 0)` into the object frame; its X/Y axes are the two principal
    /// axes of the point cloud.
    Planar {
        object_from_plane: Iso3,
        centroid: Vec3,
        /// Principal axes (unit) and their variances, largest first.
        axes: [(Vec3, Real); 2],
    },
    /// Points span all three dimensions.
    General {
        centroid: Vec3,
        /// Principal axes (unit) and their variances, largest first.
        axes: [(Vec3, Real); 3],
    },
}

/// Classify object points by the spread of their covariance eigenvalues.
pub fn analyze_layout(points: &[Pt3]) -> PointLayout {
    if points.len() < 3 {
        return PointLayout::Degenerate;
    }

    let n = points.len() as Real;
    let centroid = points.iter().fold(Vec3::zeros(), |acc, p| acc + p.coords) / n;
    let mut cov = Mat3::zeros();
    for p in points {
        let d = p.coords - centroid;
        cov += d * d.transpose();
    }
    cov /= n;

    let eig = SymmetricEigen::new(cov);
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| eig.eigenvalues[b].total_cmp(&eig.eigenvalues[a]));
    let axis = |i: usize| -> (Vec3, Real) {
        (
            eig.eigenvectors.column(order[i]).into_owned(),
            eig.eigenvalues[order[i]].max(0.0),
        )
    };
    let (e0, l0) = axis(0);
    let (e1, l1) = axis(1);
    let (e2, l2) = axis(2);

    if l0 <= Real::EPSILON || l1 <= COLLINEAR_EPS * l0 {
        return PointLayout::Degenerate;
    }

    if l2 <= PLANAR_EPS * l0 {
        let normal = e0.cross(&e1);
        let r = Mat3::from_columns(&[e0, e1, normal]);
        let rot = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
        return PointLayout::Planar {
            object_from_plane: Iso3::from_parts(centroid.into(), rot),
            centroid,
            axes: [(e0, l0), (e1, l1)],
        };
    }

    PointLayout::General {
        centroid,
        axes: [(e0, l0), (e1, l1), (e2, l2)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_2d_centering() {
        let pts = vec![Pt2::new(1.0, 1.0), Pt2::new(3.0, 1.0), Pt2::new(2.0, 4.0)];
        let (norm, t) = normalize_points_2d(&pts).unwrap();
        let sum = norm
            .iter()
            .fold(nalgebra::Vector2::zeros(), |a, p| a + p.coords);
        let mean = sum / 3.0;
        assert!(mean.norm() < 1e-12);
        let mean_dist = norm.iter().map(|p| p.coords.norm()).sum::<Real>() / 3.0;
        assert!((mean_dist - 2.0_f64.sqrt()).abs() < 1e-12);

        let back = t * Vec3::new(pts[2].x, pts[2].y, 1.0);
        assert!((back.x - norm[2].x).abs() < 1e-12);
        assert!((back.y - norm[2].y).abs() < 1e-12);
    }

    #[test]
    fn null_vector_of_wide_system() {
        // x + y + z = 0 and x - y = 0 → null space along (1, 1, -2).
        let a = DMatrix::from_row_slice(2, 3, &[1.0, 1.0, 1.0, 1.0, -1.0, 0.0]);
        let v = null_vector(&a).unwrap();
        assert!((&a * &v).norm() < 1e-12);
        assert!((v.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn layout_classification() {
        let collinear: Vec<Pt3> = (0..5)
            .map(|i| Pt3::new(i as Real, 2.0 * i as Real, 0.0))
            .collect();
        assert!(matches!(
            analyze_layout(&collinear),
            PointLayout::Degenerate
        ));

        let coincident = vec![Pt3::new(0.1, 0.2, 0.3); 4];
        assert!(matches!(
            analyze_layout(&coincident),
            PointLayout::Degenerate
        ));

        let square = ibvs_core::synthetic::target::square(0.05);
        match analyze_layout(&square) {
            PointLayout::Planar {
                object_from_plane, ..
            } => {
                // Every corner lands on plane z = 0.
                for p in &square {
                    let q = object_from_plane.inverse_transform_point(p);
                    assert!(q.z.abs() < 1e-12, "q={q:?}");
                }
            }
            other => panic!("expected planar layout, got {other:?}"),
        }

        let bit = |i: usize, k: usize| ((i >> k) & 1) as Real;
        let cube: Vec<Pt3> = (0..8)
            .map(|i| Pt3::new(bit(i, 0), bit(i, 1), bit(i, 2)))
            .collect();
        assert!(matches!(analyze_layout(&cube), PointLayout::General { .. }));
    }
}
