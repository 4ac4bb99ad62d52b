//! Image-plane point features.
//!
//! Trackers report pixel centroids; the servo law works on undistorted
//! normalized coordinates `(x, y)` plus the depth `Z` of the point in the
//! camera frame.

use ibvs_core::{CameraModel, CameraParams, Iso3, Pt2, Pt3, Real, Vec2};
use serde::{Deserialize, Serialize};

/// Normalized image point with its camera-frame depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeaturePoint2D {
    pub x: Real,
    pub y: Real,
    pub z: Real,
}

impl FeaturePoint2D {
    pub fn new(x: Real, y: Real, z: Real) -> Self {
        Self { x, y, z }
    }

    /// Perspective projection of a camera-frame point.
    ///
    /// No depth check: a point on or behind the camera plane yields a
    /// feature with `z <= 0` that the interaction model rejects by index.
    pub fn from_camera_point(p_c: &Pt3) -> Self {
        Self {
            x: p_c.x / p_c.z,
            y: p_c.y / p_c.z,
            z: p_c.z,
        }
    }

    pub fn xy(&self) -> Pt2 {
        Pt2::new(self.x, self.y)
    }
}

/// Pixel centroid to normalized coordinates through the inverse camera model.
#[derive(Debug, Clone)]
pub struct FeatureAdapter {
    camera: CameraModel,
}

impl FeatureAdapter {
    pub fn new(params: &CameraParams) -> Self {
        Self {
            camera: params.build(),
        }
    }

    pub fn camera(&self) -> &CameraModel {
        &self.camera
    }

    /// `K⁻¹` followed by the iterative inverse of the lens distortion.
    pub fn normalize(&self, pixel: &Pt2) -> Pt2 {
        Pt2::from(self.camera.pixel_to_normalized(&pixel.coords))
    }

    pub fn normalize_all(&self, pixels: &[Pt2]) -> Vec<Pt2> {
        pixels.iter().map(|p| self.normalize(p)).collect()
    }

    /// Forward model, normalized coordinates to pixels.
    pub fn to_pixel(&self, normalized: &Pt2) -> Pt2 {
        let px: Vec2 = self.camera.normalized_to_pixel(&normalized.coords);
        Pt2::from(px)
    }
}

/// Features of `object` seen from `cam_from_object` (used for the desired set).
pub fn features_from_pose(cam_from_object: &Iso3, object: &[Pt3]) -> Vec<FeaturePoint2D> {
    object
        .iter()
        .map(|p| FeaturePoint2D::from_camera_point(&cam_from_object.transform_point(p)))
        .collect()
}

/// Current features: measured normalized coordinates, depth from the pose
/// estimate. Index `i` of `measured` must correspond to `object[i]`.
pub fn current_features(
    measured: &[Pt2],
    cam_from_object: &Iso3,
    object: &[Pt3],
) -> Vec<FeaturePoint2D> {
    measured
        .iter()
        .zip(object)
        .map(|(m, p)| FeaturePoint2D::new(m.x, m.y, cam_from_object.transform_point(p).z))
        .collect()
}
