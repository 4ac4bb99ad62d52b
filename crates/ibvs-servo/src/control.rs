//! Proportional IBVS control law `v = -λ L⁺ e`.

use crate::error::ServoError;
use crate::features::FeaturePoint2D;
use crate::interaction::{stack_task, InteractionSource};
use ibvs_core::{Real, Vec6};
use log::warn;
use nalgebra::{DMatrix, DVector};

/// Default relative threshold on singular values of `L`.
pub const DEFAULT_RANK_TOLERANCE: Real = 1e-8;

/// Moore-Penrose pseudo-inverse through SVD.
///
/// Singular values below `max(σ) * rel_tol` are treated as zero, and so are
/// all singular values of a zero (or non-finite) matrix. Returns the
/// pseudo-inverse and the numerical rank.
pub fn pseudo_inverse(m: &DMatrix<Real>, rel_tol: Real) -> (DMatrix<Real>, usize) {
    let (rows, cols) = m.shape();
    let zero = DMatrix::zeros(cols, rows);
    if rows == 0 || cols == 0 || !m.iter().all(|v| v.is_finite()) {
        return (zero, 0);
    }

    let svd = m.clone().svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u.as_ref(), svd.v_t.as_ref()) else {
        return (zero, 0);
    };
    let sigma_max = svd.singular_values.max();
    if !(sigma_max > 0.0) {
        return (zero, 0);
    }

    let threshold = sigma_max * rel_tol.max(0.0);
    let mut pinv = zero;
    let mut rank = 0;
    for (k, &s) in svd.singular_values.iter().enumerate() {
        if s > threshold {
            rank += 1;
            pinv += v_t.row(k).transpose() * u.column(k).transpose() / s;
        }
    }
    (pinv, rank)
}

/// Immutable per-cycle task: interaction matrix, error and gain.
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    /// Stacked interaction matrix `L` (2N x 6).
    pub interaction: DMatrix<Real>,
    /// Stacked error `s - s*` (2N).
    pub error: DVector<Real>,
    pub lambda: Real,
    pub rank_tolerance: Real,
}

/// Command and telemetry of one control step.
#[derive(Debug, Clone)]
pub struct ControlOutput {
    /// Camera twist `(vx, vy, vz, wx, wy, wz)`.
    pub velocity: Vec6,
    pub error: DVector<Real>,
    /// Numerical rank of `L`.
    pub rank: usize,
    pub error_norm: Real,
}

/// `v = -λ L⁺ e`. A rank-0 task yields a zero command.
pub fn compute_control_law(task: &TaskSnapshot) -> ControlOutput {
    let (pinv, rank) = pseudo_inverse(&task.interaction, task.rank_tolerance);
    let velocity = if rank == 0 || pinv.ncols() != task.error.len() {
        warn!("interaction matrix has rank 0, commanding zero velocity");
        Vec6::zeros()
    } else {
        let v = pinv * &task.error * -task.lambda;
        Vec6::from_iterator(v.iter().copied())
    };

    ControlOutput {
        velocity,
        error_norm: task.error.norm(),
        error: task.error.clone(),
        rank,
    }
}

/// Desired features and gain, fixed for the whole run.
#[derive(Debug, Clone)]
pub struct ServoTask {
    desired: Vec<FeaturePoint2D>,
    lambda: Real,
    source: InteractionSource,
    rank_tolerance: Real,
}

impl ServoTask {
    /// Requires a non-empty desired set with positive depths and `λ > 0`.
    pub fn new(desired: Vec<FeaturePoint2D>, lambda: Real) -> Result<Self, ServoError> {
        if !(lambda.is_finite() && lambda > 0.0) {
            return Err(ServoError::Config(format!(
                "gain must be positive and finite, got {lambda}"
            )));
        }
        if desired.is_empty() {
            return Err(ServoError::Config("desired feature set is empty".into()));
        }
        if let Some((index, f)) = desired
            .iter()
            .enumerate()
            .find(|(_, f)| !(f.z.is_finite() && f.z > 0.0))
        {
            return Err(ServoError::InvalidDepth { index, depth: f.z });
        }
        Ok(Self {
            desired,
            lambda,
            source: InteractionSource::default(),
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
        })
    }

    pub fn with_source(mut self, source: InteractionSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_rank_tolerance(mut self, rank_tolerance: Real) -> Self {
        self.rank_tolerance = rank_tolerance;
        self
    }

    pub fn desired(&self) -> &[FeaturePoint2D] {
        &self.desired
    }

    pub fn lambda(&self) -> Real {
        self.lambda
    }

    pub fn source(&self) -> InteractionSource {
        self.source
    }

    /// Build this cycle's snapshot from the current features.
    pub fn snapshot(&self, current: &[FeaturePoint2D]) -> Result<TaskSnapshot, ServoError> {
        let (interaction, error) = stack_task(current, &self.desired, self.source)?;
        Ok(TaskSnapshot {
            interaction,
            error,
            lambda: self.lambda,
            rank_tolerance: self.rank_tolerance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::features_from_pose;
    use ibvs_core::synthetic::target;
    use ibvs_core::{pose_from_translation_rxyz, Rxyz, Vec3};

    fn reference_task() -> ServoTask {
        let pose = pose_from_translation_rxyz(Vec3::new(0.0, 0.0, 0.7), &Rxyz::default());
        ServoTask::new(features_from_pose(&pose, &target::square(0.05)), 0.1).unwrap()
    }

    #[test]
    fn pseudo_inverse_of_full_rank_matrix() {
        let m = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let (p, rank) = pseudo_inverse(&m, DEFAULT_RANK_TOLERANCE);
        assert_eq!(rank, 2);
        assert_eq!(p.shape(), (2, 3));
        let id = &p * &m;
        assert!((id - DMatrix::identity(2, 2)).norm() < 1e-12);
    }

    #[test]
    fn pseudo_inverse_of_zero_matrix_is_zero() {
        let (p, rank) = pseudo_inverse(&DMatrix::zeros(8, 6), DEFAULT_RANK_TOLERANCE);
        assert_eq!(rank, 0);
        assert!(p.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn pseudo_inverse_drops_small_singular_values() {
        let m = DMatrix::from_diagonal(&DVector::from_vec(vec![1.0, 1e-12, 0.5]));
        let (p, rank) = pseudo_inverse(&m, DEFAULT_RANK_TOLERANCE);
        assert_eq!(rank, 2);
        assert!((p[(0, 0)] - 1.0).abs() < 1e-12);
        assert_eq!(p[(1, 1)], 0.0);
        assert!((p[(2, 2)] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_error_is_a_fixed_point() {
        let task = reference_task();
        for z in [0.1, 0.7, 3.0] {
            let current: Vec<FeaturePoint2D> = task
                .desired()
                .iter()
                .map(|f| FeaturePoint2D::new(f.x, f.y, z))
                .collect();
            let out = compute_control_law(&task.snapshot(&current).unwrap());
            assert_eq!(out.error_norm, 0.0);
            assert_eq!(out.velocity, Vec6::zeros());
            assert_eq!(out.rank, 6);
        }
    }

    #[test]
    fn rank_zero_task_commands_zero() {
        let snapshot = TaskSnapshot {
            interaction: DMatrix::zeros(8, 6),
            error: DVector::from_element(8, 0.3),
            lambda: 0.1,
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
        };
        let out = compute_control_law(&snapshot);
        assert_eq!(out.rank, 0);
        assert_eq!(out.velocity, Vec6::zeros());
        assert!(out.error_norm > 0.0);
    }

    #[test]
    fn lateral_offset_commands_opposing_translation() {
        let task = reference_task();
        // Features shifted to +x: camera must move towards +x (v_x > 0).
        let current: Vec<FeaturePoint2D> = task
            .desired()
            .iter()
            .map(|f| FeaturePoint2D::new(f.x + 0.01, f.y, f.z))
            .collect();
        let out = compute_control_law(&task.snapshot(&current).unwrap());
        assert!(out.velocity.iter().all(|v| v.is_finite()));
        assert!(out.velocity[0] > 0.0, "v = {:?}", out.velocity);
        // L v = -λ e for a full-rank, consistent task.
        let lv = &task.snapshot(&current).unwrap().interaction
            * DVector::from_iterator(6, out.velocity.iter().copied());
        let expected = &out.error * -0.1;
        assert!((lv - expected).norm() < 1e-6);
    }

    #[test]
    fn task_rejects_bad_configuration() {
        let desired = vec![FeaturePoint2D::new(0.0, 0.0, 1.0)];
        let rejected = |r: Result<ServoTask, ServoError>| matches!(r, Err(ServoError::Config(_)));
        assert!(rejected(ServoTask::new(desired.clone(), 0.0)));
        assert!(rejected(ServoTask::new(desired, Real::NAN)));
        assert!(rejected(ServoTask::new(Vec::new(), 0.1)));
        assert!(matches!(
            ServoTask::new(vec![FeaturePoint2D::new(0.0, 0.0, -1.0)], 0.1),
            Err(ServoError::InvalidDepth { index: 0, .. })
        ));
    }
}
