use nalgebra::{RealField, Vector2};
use serde::{Deserialize, Serialize};

/// Lens distortion acting on normalized image coordinates (`x/z`, `y/z`).
///
/// Features are tracked in distorted pixels but the interaction matrix needs
/// ideal pinhole coordinates, so every model must provide both directions.
pub trait DistortionModel<S: RealField + Copy> {
    fn distort(&self, n_undist: &Vector2<S>) -> Vector2<S>;
    fn undistort(&self, n_dist: &Vector2<S>) -> Vector2<S>;
}

/// Ideal pinhole lens.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct NoDistortion;

impl<S: RealField + Copy> DistortionModel<S> for NoDistortion {
    fn distort(&self, n_undist: &Vector2<S>) -> Vector2<S> {
        *n_undist
    }

    fn undistort(&self, n_dist: &Vector2<S>) -> Vector2<S> {
        *n_dist
    }
}

/// Iteration cap used when `iters` is left at zero.
pub const DEFAULT_UNDISTORT_ITERS: u32 = 20;

/// Brown-Conrady lens with radial terms `k1..k3` and decentering terms
/// `p1, p2`.
///
/// `undistort` inverts the model by fixed-point iteration, stopping early once
/// an update moves the estimate by less than `1e-14` in normalized units.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct BrownConrady5<S: RealField> {
    pub k1: S,
    pub k2: S,
    pub k3: S,
    pub p1: S,
    pub p2: S,
    /// Maximum undistortion iterations; zero selects [`DEFAULT_UNDISTORT_ITERS`].
    #[serde(default)]
    pub iters: u32,
}

impl<S: RealField + Copy> BrownConrady5<S> {
    /// Scale applied along the ray for squared radius `r2`.
    fn radial_gain(&self, r2: S) -> S {
        S::one() + r2 * (self.k1 + r2 * (self.k2 + r2 * self.k3))
    }

    /// Decentering offset at `n`.
    fn tangential(&self, n: &Vector2<S>) -> Vector2<S> {
        let two = S::one() + S::one();
        let (x, y) = (n.x, n.y);
        let r2 = x * x + y * y;
        Vector2::new(
            two * self.p1 * x * y + self.p2 * (r2 + two * x * x),
            self.p1 * (r2 + two * y * y) + two * self.p2 * x * y,
        )
    }

    fn max_iters(&self) -> u32 {
        if self.iters == 0 {
            DEFAULT_UNDISTORT_ITERS
        } else {
            self.iters
        }
    }
}

impl<S: RealField + Copy> DistortionModel<S> for BrownConrady5<S> {
    fn distort(&self, n_undist: &Vector2<S>) -> Vector2<S> {
        n_undist * self.radial_gain(n_undist.norm_squared()) + self.tangential(n_undist)
    }

    fn undistort(&self, n_dist: &Vector2<S>) -> Vector2<S> {
        let tol = nalgebra::convert::<f64, S>(1e-14);
        let mut n = *n_dist;
        for _ in 0..self.max_iters() {
            let gain = self.radial_gain(n.norm_squared());
            // Past the fold of a strongly negative k1 the model is not invertible.
            if gain <= S::zero() {
                break;
            }
            let next = (n_dist - self.tangential(&n)) / gain;
            let step = (next - n).norm();
            n = next;
            if step < tol {
                break;
            }
        }
        n
    }
}
