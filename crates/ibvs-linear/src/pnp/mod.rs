//! Perspective-n-Point (PnP) solvers for camera pose estimation.
//!
//! Includes:
//! - EPnP (control-point formulation) for coplanar targets (4+ points) and
//!   general 3D targets (6+ points).
//! - Planar homography decomposition for coplanar targets (4+ points).
//! - DLT of `[R | t]` for general 3D targets (6+ points).
//!
//! Image points are normalized camera coordinates (`Z = 1` plane). All
//! methods estimate a pose `T_C_O`: transform from object coordinates into
//! the camera frame.

use crate::math::{analyze_layout, PointLayout};
use ibvs_core::{Iso3, Pt2, Pt3};
use log::debug;
use thiserror::Error;

mod dlt;
mod epnp;
mod planar;
mod pose_utils;

pub use dlt::dlt;
pub use epnp::epnp;
pub use planar::planar_homography_pose;

/// Errors that can occur during closed-form pose estimation.
#[derive(Debug, Error)]
pub enum PnpError {
    /// Not enough point correspondences for the chosen solver and layout.
    #[error("need at least {needed} point correspondences, got {got}")]
    NotEnoughPoints { needed: usize, got: usize },
    /// 3D and 2D inputs have different lengths.
    #[error("mismatched correspondences: {world} object points vs {image} image points")]
    MismatchedLengths { world: usize, image: usize },
    /// Object points are coincident or collinear.
    #[error("degenerate point configuration (coincident or collinear points)")]
    DegeneratePoints,
    /// Object points are coplanar but the solver needs a 3D configuration.
    #[error("solver requires non-coplanar object points")]
    PlanarPoints,
    /// Object points span 3D but the solver needs a coplanar target.
    #[error("solver requires coplanar object points")]
    NonPlanarPoints,
    /// Homography estimation failed on a planar target.
    #[error("homography estimation failed: {0}")]
    Homography(#[from] crate::homography::HomographyError),
    /// Linear solve (SVD) failed.
    #[error("svd failed in PnP solve")]
    SvdFailed,
}

/// Closed-form PnP solvers operating on normalized image coordinates.
#[derive(Debug, Clone, Copy)]
pub struct PnpSolver;

impl PnpSolver {
    /// EPnP pose estimation.
    ///
    /// Uses 3 control points for coplanar object points (4+ points) and 4
    /// control points otherwise (6+ points).
    pub fn epnp(world: &[Pt3], image: &[Pt2]) -> Result<Iso3, PnpError> {
        epnp::epnp(world, image)
    }

    /// Direct linear pose: homography decomposition for coplanar points,
    /// DLT otherwise.
    pub fn linear(world: &[Pt3], image: &[Pt2]) -> Result<Iso3, PnpError> {
        linear_pose(world, image)
    }

    /// Normalized DLT of `[R | t]` on 6+ non-coplanar points.
    pub fn dlt(world: &[Pt3], image: &[Pt2]) -> Result<Iso3, PnpError> {
        dlt::dlt(world, image)
    }
}

/// Direct linear pose estimation, dispatched on the object point layout.
///
/// Coplanar targets go through a plane-induced homography; general 3D
/// targets through the normalized DLT.
pub fn linear_pose(world: &[Pt3], image: &[Pt2]) -> Result<Iso3, PnpError> {
    check_inputs(world, image, 4)?;
    match analyze_layout(world) {
        PointLayout::Degenerate => Err(PnpError::DegeneratePoints),
        PointLayout::Planar {
            object_from_plane, ..
        } => {
            debug!("linear pose: coplanar target, homography decomposition");
            planar::planar_homography_pose_in_frame(world, image, &object_from_plane)
        }
        PointLayout::General { .. } => {
            debug!("linear pose: 3D target, DLT");
            dlt::dlt(world, image)
        }
    }
}

pub(crate) fn check_inputs(world: &[Pt3], image: &[Pt2], needed: usize) -> Result<(), PnpError> {
    if world.len() != image.len() {
        return Err(PnpError::MismatchedLengths {
            world: world.len(),
            image: image.len(),
        });
    }
    if world.len() < needed {
        return Err(PnpError::NotEnoughPoints {
            needed,
            got: world.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_scene {
    use ibvs_core::{pose_from_translation_rxyz, synthetic::target, Iso3, Pt2, Pt3, Rxyz, Vec3};

    pub fn pose_error(a: &Iso3, b: &Iso3) -> (f64, f64) {
        (
            ibvs_core::translation_distance(a, b),
            ibvs_core::rotation_distance(a, b),
        )
    }

    pub fn tilted_pose() -> Iso3 {
        pose_from_translation_rxyz(Vec3::new(0.03, -0.02, 0.65), &Rxyz::new(0.2, -0.15, 0.4))
    }

    pub fn project(pose: &Iso3, world: &[Pt3]) -> Vec<Pt2> {
        target::project_normalized_all(pose, world).unwrap()
    }

    pub fn box_points() -> Vec<Pt3> {
        let mut world = Vec::new();
        for z in 0..2 {
            for y in 0..3 {
                for x in 0..4 {
                    world.push(Pt3::new(
                        x as f64 * 0.04 - 0.06,
                        y as f64 * 0.04 - 0.04,
                        z as f64 * 0.05,
                    ));
                }
            }
        }
        world
    }
}
