//! Reproducible measurement jitter for simulated cameras.
//!
//! Every offset is a pure function of `(seed, frame, point)`, so a replayed
//! run sees exactly the same noisy pixels no matter how many frames were
//! skipped or in which order points are visited.

use crate::{Real, Vec2};

/// Bounded uniform jitter added to each tracked point of each frame.
///
/// `amplitude` is in the caller's units (pixels for the simulated camera).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameJitter {
    pub seed: u64,
    pub amplitude: Real,
}

impl FrameJitter {
    pub fn new(seed: u64, amplitude: Real) -> Self {
        Self { seed, amplitude }
    }

    /// Offset for point `point` in frame `frame`, each axis in
    /// `[-amplitude, amplitude)`.
    pub fn offset(&self, frame: usize, point: usize) -> Vec2 {
        let a = self.amplitude.abs();
        if a == 0.0 {
            return Vec2::zeros();
        }
        let key = ((frame as u64) << 32) ^ point as u64;
        let hx = fmix64(self.seed.wrapping_add(fmix64(key)));
        let hy = fmix64(hx);
        Vec2::new(a * symmetric_unit(hx), a * symmetric_unit(hy))
    }

    pub fn perturb(&self, frame: usize, point: usize, value: Vec2) -> Vec2 {
        value + self.offset(frame, point)
    }
}

/// MurmurHash3 64-bit finalizer.
fn fmix64(mut h: u64) -> u64 {
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^ (h >> 33)
}

/// Top 53 bits of `h` mapped onto `[-1, 1)`.
fn symmetric_unit(h: u64) -> Real {
    const SCALE: Real = 1.0 / (1u64 << 52) as Real;
    (h >> 11) as Real * SCALE - 1.0
}
