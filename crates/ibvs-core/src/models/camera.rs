use nalgebra::{Point3, RealField, Vector2, Vector3};

use super::{DistortionModel, IntrinsicsModel};

/// Unit viewing ray in the camera frame.
#[derive(Clone, Copy, Debug)]
pub struct Ray<S: RealField + Copy> {
    pub dir: Vector3<S>,
}

/// Pinhole camera with a lens distortion stage and a pixel mapping stage.
///
/// Forward chain: `pixel = k(dist(x / z, y / z))`.
#[derive(Clone, Debug)]
pub struct Camera<S, D, K>
where
    S: RealField + Copy,
    D: DistortionModel<S>,
    K: IntrinsicsModel<S>,
{
    pub dist: D,
    pub k: K,
    _phantom: core::marker::PhantomData<S>,
}

impl<S, D, K> Camera<S, D, K>
where
    S: RealField + Copy,
    D: DistortionModel<S>,
    K: IntrinsicsModel<S>,
{
    pub fn new(dist: D, k: K) -> Self {
        Self {
            dist,
            k,
            _phantom: core::marker::PhantomData,
        }
    }

    /// Undistorted normalized coordinates and depth of a camera-frame point;
    /// `None` on or behind the image plane.
    pub fn normalize_point_c(&self, p_c: &Vector3<S>) -> Option<(Vector2<S>, S)> {
        if p_c.z <= S::zero() {
            return None;
        }
        Some((Vector2::new(p_c.x / p_c.z, p_c.y / p_c.z), p_c.z))
    }

    /// Project a camera-frame point to pixels; `None` if behind the camera.
    pub fn project_point_c(&self, p_c: &Vector3<S>) -> Option<Vector2<S>> {
        let (n_u, _) = self.normalize_point_c(p_c)?;
        Some(self.normalized_to_pixel(&n_u))
    }

    pub fn project_point(&self, p_c: &Point3<S>) -> Option<Vector2<S>> {
        self.project_point_c(&p_c.coords)
    }

    /// Undistorted normalized coordinates to pixels.
    pub fn normalized_to_pixel(&self, n_u: &Vector2<S>) -> Vector2<S> {
        self.k.to_pixel(&self.dist.distort(n_u))
    }

    /// Pixels to undistorted normalized coordinates (pixel-to-meter conversion).
    pub fn pixel_to_normalized(&self, px: &Vector2<S>) -> Vector2<S> {
        self.dist.undistort(&self.k.from_pixel(px))
    }

    pub fn backproject_pixel(&self, px: &Vector2<S>) -> Ray<S> {
        let n_u = self.pixel_to_normalized(px);
        let dir = Vector3::new(n_u.x, n_u.y, S::one());
        Ray {
            dir: dir / dir.norm(),
        }
    }
}
