//! Reprojection-error refinement of a single camera pose.
//!
//! Parameters: `[wx, wy, wz, tx, ty, tz]`, the axis-angle rotation and the
//! translation of `T_C_O`. Residuals: per point, the normalized-image
//! difference `(X/Z - u, Y/Z - v)` with `[X Y Z] = T_C_O * P`.

use crate::{NllsProblem, NllsSolverBackend, SolveOptions, SolveReport};
use ibvs_core::{Iso3, Pt2, Pt3, Real, Vec3};
use nalgebra::{DMatrix, DVector, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};

/// Points closer than this to the camera plane are clamped when computing
/// residuals so the cost stays finite.
const MIN_DEPTH: Real = 1e-6;
/// Central-difference step for the Jacobian.
const FD_STEP: Real = 1e-7;

/// Stopping criteria for pose refinement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefineOptions {
    pub max_iters: usize,
    pub ftol: Real,
    pub gtol: Real,
    pub xtol: Real,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            max_iters: 50,
            ftol: 1e-12,
            gtol: 1e-12,
            xtol: 1e-12,
        }
    }
}

impl From<&RefineOptions> for SolveOptions {
    fn from(o: &RefineOptions) -> Self {
        SolveOptions {
            max_iters: o.max_iters,
            ftol: o.ftol,
            gtol: o.gtol,
            xtol: o.xtol,
        }
    }
}

/// Object/image correspondences for one view.
#[derive(Debug, Clone, Copy)]
pub struct PoseRefineProblem<'a> {
    world: &'a [Pt3],
    image: &'a [Pt2],
}

impl<'a> PoseRefineProblem<'a> {
    /// Correspondences are matched by index; extra entries of the longer
    /// slice are ignored.
    pub fn new(world: &'a [Pt3], image: &'a [Pt2]) -> Self {
        debug_assert_eq!(world.len(), image.len());
        Self { world, image }
    }

    pub fn len(&self) -> usize {
        self.world.len().min(self.image.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pack a pose into `[axis-angle, translation]`.
pub fn pack_pose(pose: &Iso3) -> DVector<Real> {
    let w = pose.rotation.scaled_axis();
    let t = pose.translation.vector;
    DVector::from_vec(vec![w.x, w.y, w.z, t.x, t.y, t.z])
}

/// Inverse of [`pack_pose`].
pub fn unpack_pose(x: &DVector<Real>) -> Iso3 {
    let rot = UnitQuaternion::from_scaled_axis(Vec3::new(x[0], x[1], x[2]));
    Iso3::from_parts(Translation3::new(x[3], x[4], x[5]), rot)
}

impl NllsProblem for PoseRefineProblem<'_> {
    fn num_params(&self) -> usize {
        6
    }

    fn num_residuals(&self) -> usize {
        2 * self.len()
    }

    fn residuals(&self, x: &DVector<Real>) -> DVector<Real> {
        let pose = unpack_pose(x);
        let mut r = DVector::zeros(self.num_residuals());
        for (i, (pw, uv)) in self.world.iter().zip(self.image).enumerate() {
            let pc = pose.transform_point(pw);
            let z = pc.z.max(MIN_DEPTH);
            r[2 * i] = pc.x / z - uv.x;
            r[2 * i + 1] = pc.y / z - uv.y;
        }
        r
    }

    fn jacobian(&self, x: &DVector<Real>) -> DMatrix<Real> {
        let mut j = DMatrix::zeros(self.num_residuals(), 6);
        for k in 0..6 {
            let mut xp = x.clone();
            let mut xm = x.clone();
            xp[k] += FD_STEP;
            xm[k] -= FD_STEP;
            let diff = (self.residuals(&xp) - self.residuals(&xm)) / (2.0 * FD_STEP);
            j.set_column(k, &diff);
        }
        j
    }
}

/// Mean reprojection error (normalized image units) of `pose`.
///
/// Infinite if any point is on or behind the camera plane, so such poses
/// never win a residual comparison. Zero for empty input.
pub fn mean_reprojection_residual(pose: &Iso3, world: &[Pt3], image: &[Pt2]) -> Real {
    let n = world.len().min(image.len());
    if n == 0 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (pw, uv) in world.iter().zip(image) {
        let pc = pose.transform_point(pw);
        if pc.z <= 0.0 {
            return Real::INFINITY;
        }
        sum += (Pt2::new(pc.x / pc.z, pc.y / pc.z).coords - uv.coords).norm();
    }
    sum / n as Real
}

/// Refined pose with the solver's own report.
#[derive(Debug, Clone)]
pub struct PoseRefinement {
    pub pose: Iso3,
    pub residual: Real,
    pub report: SolveReport,
}

/// Refine `seed` by minimizing the reprojection error of the correspondences.
pub fn refine_pose<B: NllsSolverBackend>(
    backend: &B,
    world: &[Pt3],
    image: &[Pt2],
    seed: &Iso3,
    opts: &RefineOptions,
) -> PoseRefinement {
    let problem = PoseRefineProblem::new(world, image);
    let (x_opt, report) = backend.solve(&problem, pack_pose(seed), &SolveOptions::from(opts));
    let pose = unpack_pose(&x_opt);
    PoseRefinement {
        residual: mean_reprojection_residual(&pose, world, image),
        pose,
        report,
    }
}
