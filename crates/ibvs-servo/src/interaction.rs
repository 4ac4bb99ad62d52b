//! Point-feature interaction matrices and task stacking.

use crate::error::ServoError;
use crate::features::FeaturePoint2D;
use ibvs_core::Real;
use nalgebra::{DMatrix, DVector, SMatrix};
use serde::{Deserialize, Serialize};

/// 2x6 interaction matrix of one point feature.
pub type PointInteraction = SMatrix<Real, 2, 6>;

/// Which features the interaction matrix is evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionSource {
    /// Current features and depths, refreshed every cycle.
    #[default]
    Current,
    /// Desired features, constant over the run.
    Desired,
    /// `½ (L + L*)`.
    Mean,
}

/// Interaction matrix of a normalized point `(x, y)` at depth `Z`:
///
/// ```text
/// [ -1/Z   0    x/Z   x*y     -(1+x²)   y ]
/// [  0   -1/Z   y/Z   1+y²    -x*y     -x ]
/// ```
pub fn point_interaction(f: &FeaturePoint2D) -> PointInteraction {
    let (x, y) = (f.x, f.y);
    let inv_z = 1.0 / f.z;
    #[rustfmt::skip]
    let l = PointInteraction::new(
        -inv_z, 0.0,    x * inv_z, x * y,       -(1.0 + x * x), y,
        0.0,    -inv_z, y * inv_z, 1.0 + y * y, -x * y,         -x,
    );
    l
}

fn check_depth(index: usize, f: &FeaturePoint2D) -> Result<(), ServoError> {
    if f.z.is_finite() && f.z > 0.0 {
        Ok(())
    } else {
        Err(ServoError::InvalidDepth {
            index,
            depth: f.z,
        })
    }
}

/// Stacked interaction matrix `L` (2N x 6) and error `e` (2N).
///
/// Features are paired by index. Current depths are always validated,
/// desired depths only when the desired features enter `L`.
pub fn stack_task(
    current: &[FeaturePoint2D],
    desired: &[FeaturePoint2D],
    source: InteractionSource,
) -> Result<(DMatrix<Real>, DVector<Real>), ServoError> {
    if current.len() != desired.len() {
        return Err(ServoError::FeatureMismatch {
            current: current.len(),
            desired: desired.len(),
        });
    }

    let n = current.len();
    let mut l = DMatrix::zeros(2 * n, 6);
    let mut e = DVector::zeros(2 * n);

    for (i, (cur, des)) in current.iter().zip(desired).enumerate() {
        check_depth(i, cur)?;
        let li = match source {
            InteractionSource::Current => point_interaction(cur),
            InteractionSource::Desired => {
                check_depth(i, des)?;
                point_interaction(des)
            }
            InteractionSource::Mean => {
                check_depth(i, des)?;
                (point_interaction(cur) + point_interaction(des)) * 0.5
            }
        };
        l.fixed_view_mut::<2, 6>(2 * i, 0).copy_from(&li);
        e[2 * i] = cur.x - des.x;
        e[2 * i + 1] = cur.y - des.y;
    }

    Ok((l, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(n: usize) -> Vec<FeaturePoint2D> {
        (0..n)
            .map(|i| {
                let i = i as Real;
                FeaturePoint2D::new(0.01 * i, -0.02 * i, 0.5 + 0.1 * i)
            })
            .collect()
    }

    #[test]
    fn matches_closed_form_entries() {
        let l = point_interaction(&FeaturePoint2D::new(0.1, -0.2, 2.0));
        let expected = [
            [-0.5, 0.0, 0.05, -0.02, -1.01, -0.2],
            [0.0, -0.5, -0.1, 1.04, 0.02, -0.1],
        ];
        for r in 0..2 {
            for c in 0..6 {
                assert!(
                    (l[(r, c)] - expected[r][c]).abs() < 1e-15,
                    "L[{r},{c}] = {} expected {}",
                    l[(r, c)],
                    expected[r][c]
                );
            }
        }
    }

    #[test]
    fn stacked_dimensions() {
        for n in 1..=8 {
            let f = features(n);
            for source in [
                InteractionSource::Current,
                InteractionSource::Desired,
                InteractionSource::Mean,
            ] {
                let (l, e) = stack_task(&f, &f, source).unwrap();
                assert_eq!(l.shape(), (2 * n, 6));
                assert_eq!(e.len(), 2 * n);
                assert!(e.iter().all(|v| *v == 0.0));
            }
        }
    }

    #[test]
    fn error_is_current_minus_desired_in_index_order() {
        let cur = vec![
            FeaturePoint2D::new(0.3, 0.1, 1.0),
            FeaturePoint2D::new(-0.2, 0.4, 1.0),
        ];
        let des = vec![
            FeaturePoint2D::new(0.1, 0.1, 1.0),
            FeaturePoint2D::new(0.0, 0.0, 1.0),
        ];
        let (_, e) = stack_task(&cur, &des, InteractionSource::Current).unwrap();
        let expected = [0.2, 0.0, -0.2, 0.4];
        for (a, b) in e.iter().zip(expected) {
            assert!((a - b).abs() < 1e-15);
        }
    }

    #[test]
    fn invalid_depth_names_the_feature() {
        let mut cur = features(4);
        cur[2].z = 0.0;
        assert!(matches!(
            stack_task(&cur, &features(4), InteractionSource::Current),
            Err(ServoError::InvalidDepth { index: 2, .. })
        ));

        cur[2].z = Real::NAN;
        assert!(matches!(
            stack_task(&cur, &features(4), InteractionSource::Current),
            Err(ServoError::InvalidDepth { index: 2, .. })
        ));

        let mut des = features(4);
        des[1].z = -1.0;
        let current_only = stack_task(&features(4), &des, InteractionSource::Current);
        assert!(current_only.is_ok());
        assert!(matches!(
            stack_task(&features(4), &des, InteractionSource::Mean),
            Err(ServoError::InvalidDepth { index: 1, .. })
        ));
    }

    #[test]
    fn count_mismatch_is_rejected() {
        assert!(matches!(
            stack_task(&features(3), &features(4), InteractionSource::Current),
            Err(ServoError::FeatureMismatch {
                current: 3,
                desired: 4
            })
        ));
    }
}
