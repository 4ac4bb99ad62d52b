//! Hybrid pose estimation: closed-form candidates chained into LM refinement.
//!
//! Cold start runs EPnP and the direct linear estimator (homography
//! decomposition or DLT depending on the target layout), keeps the
//! candidate with the lower mean reprojection error and refines it. Warm
//! start refines the previous pose directly.

use ibvs_core::{Iso3, Pt2, Pt3, Real};
use ibvs_linear::{analyze_layout, epnp, linear_pose, PnpError, PointLayout};
use ibvs_optim::{mean_reprojection_residual, refine_pose, LmBackend, NllsSolverBackend};
use ibvs_optim::{RefineOptions, SolveReport};
use log::debug;
use serde::Serialize;
use thiserror::Error;

/// How the refinement is seeded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoseMode {
    /// No usable prior: compute closed-form candidates.
    ColdStart,
    /// Seed refinement with the pose of the previous cycle.
    WarmStart(Iso3),
}

/// Origin of the refinement seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedMethod {
    Epnp,
    Linear,
    Previous,
}

/// A closed-form pose and its mean reprojection error.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub method: SeedMethod,
    pub pose: Iso3,
    pub residual: Real,
}

#[derive(Debug, Clone)]
pub struct PoseEstimate {
    /// Refined `T_C_O`.
    pub pose: Iso3,
    /// Mean reprojection error of `pose`, normalized image units.
    pub residual: Real,
    pub seed: SeedMethod,
    /// Closed-form candidates evaluated on cold start (empty on warm start).
    pub candidates: Vec<Candidate>,
    pub report: SolveReport,
}

#[derive(Debug, Error)]
pub enum PoseError {
    #[error("need at least 4 point correspondences, got {0}")]
    NotEnoughPoints(usize),
    #[error("mismatched correspondences: {world} object points vs {image} image points")]
    MismatchedLengths { world: usize, image: usize },
    #[error("object points are coincident or collinear")]
    DegeneratePoints,
    #[error("no closed-form pose candidate (epnp: {epnp}; linear: {linear})")]
    NoCandidate { epnp: PnpError, linear: PnpError },
}

/// Lowest-residual candidate; ties keep the earlier one, NaN never wins.
pub fn select_seed(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates
        .iter()
        .filter(|c| !c.residual.is_nan())
        .fold(None, |best: Option<&Candidate>, c| match best {
            Some(b) if b.residual <= c.residual => Some(b),
            _ => Some(c),
        })
}

/// Pose estimator with a pluggable least-squares backend.
#[derive(Debug, Clone)]
pub struct PoseEstimator<B = LmBackend> {
    backend: B,
    opts: RefineOptions,
}

impl PoseEstimator<LmBackend> {
    pub fn new(opts: RefineOptions) -> Self {
        Self {
            backend: LmBackend,
            opts,
        }
    }
}

impl Default for PoseEstimator<LmBackend> {
    fn default() -> Self {
        Self::new(RefineOptions::default())
    }
}

impl<B: NllsSolverBackend> PoseEstimator<B> {
    pub fn with_backend(backend: B, opts: RefineOptions) -> Self {
        Self { backend, opts }
    }

    pub fn options(&self) -> &RefineOptions {
        &self.opts
    }

    /// Estimate `T_C_O` from object points and their normalized image
    /// coordinates (matched by index).
    pub fn estimate_pose(
        &self,
        world: &[Pt3],
        image: &[Pt2],
        mode: &PoseMode,
    ) -> Result<PoseEstimate, PoseError> {
        validate(world, image)?;

        let (seed_pose, seed, candidates) = match mode {
            PoseMode::WarmStart(previous) => (*previous, SeedMethod::Previous, Vec::new()),
            PoseMode::ColdStart => {
                let candidates = closed_form_candidates(world, image)?;
                let best = select_seed(&candidates)
                    .or(candidates.first())
                    .cloned()
                    .ok_or(PoseError::DegeneratePoints)?;
                (best.pose, best.method, candidates)
            }
        };

        let refined = refine_pose(&self.backend, world, image, &seed_pose, &self.opts);
        debug!(
            "pose: seed {:?}, residual {:.3e}, {} evaluations",
            seed, refined.residual, refined.report.iterations
        );

        Ok(PoseEstimate {
            pose: refined.pose,
            residual: refined.residual,
            seed,
            candidates,
            report: refined.report,
        })
    }
}

fn validate(world: &[Pt3], image: &[Pt2]) -> Result<(), PoseError> {
    if world.len() != image.len() {
        return Err(PoseError::MismatchedLengths {
            world: world.len(),
            image: image.len(),
        });
    }
    if world.len() < 4 {
        return Err(PoseError::NotEnoughPoints(world.len()));
    }
    if matches!(analyze_layout(world), PointLayout::Degenerate) {
        return Err(PoseError::DegeneratePoints);
    }
    Ok(())
}

/// Run both closed-form estimators. Never returns an empty list.
fn closed_form_candidates(world: &[Pt3], image: &[Pt2]) -> Result<Vec<Candidate>, PoseError> {
    let evaluate = |method, result: Result<Iso3, PnpError>| {
        result.map(|pose| {
            let residual = mean_reprojection_residual(&pose, world, image);
            debug!("pose candidate {method:?}: residual {residual:.3e}");
            Candidate {
                method,
                pose,
                residual,
            }
        })
    };

    let epnp_res = evaluate(SeedMethod::Epnp, epnp(world, image));
    let linear_res = evaluate(SeedMethod::Linear, linear_pose(world, image));

    match (epnp_res, linear_res) {
        (Err(epnp), Err(linear)) => Err(PoseError::NoCandidate { epnp, linear }),
        (a, b) => Ok(a.into_iter().chain(b).collect()),
    }
}
