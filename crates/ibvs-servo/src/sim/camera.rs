//! Simulated image source and centroid trackers.

use super::SharedWorld;
use crate::error::ServoError;
use crate::servo_loop::{FeatureTracker, FrameSource};
use ibvs_core::{Pt2, Real};

/// Rendered feature centroids, `None` where a point is not visible.
#[derive(Debug, Clone)]
pub struct SimFrame {
    pub index: usize,
    pub centroids: Vec<Option<Pt2>>,
}

#[derive(Debug, Clone)]
pub struct SimCamera {
    pub(super) world: SharedWorld,
}

impl FrameSource for SimCamera {
    type Frame = SimFrame;

    fn acquire(&mut self) -> Result<SimFrame, ServoError> {
        let mut w = self.world.borrow_mut();
        let index = w.frames;
        w.frames += 1;

        let centroids = (0..w.object.len())
            .map(|i| {
                if w.hidden.contains(&i) {
                    return None;
                }
                let p_c = w.cam_from_object.transform_point(&w.object[i]);
                let px = w.camera.project_point(&p_c)?;
                let (width, height) = w.image_size;
                if px.x < 0.0 || px.y < 0.0 || px.x >= width || px.y >= height {
                    return None;
                }
                let mut px = px;
                if let Some(offset) = w.pixel_offsets.get(i) {
                    px += offset;
                }
                if let Some(noise) = &w.noise {
                    px = noise.perturb(index, i, px);
                }
                Some(Pt2::from(px))
            })
            .collect();

        Ok(SimFrame { index, centroids })
    }
}

/// Nearest-centroid tracker with a bounded inter-frame jump.
#[derive(Debug, Clone)]
pub struct SimTracker {
    index: usize,
    locked: Option<usize>,
    last: Option<Pt2>,
    search_radius: Real,
    max_jump: Real,
}

impl SimTracker {
    /// `index` is the feature slot reported in [`ServoError::TrackLost`].
    pub fn new(index: usize) -> Self {
        Self {
            index,
            locked: None,
            last: None,
            search_radius: 20.0,
            max_jump: 30.0,
        }
    }

    pub fn with_limits(mut self, search_radius: Real, max_jump: Real) -> Self {
        self.search_radius = search_radius;
        self.max_jump = max_jump;
        self
    }

    fn lost(&self) -> ServoError {
        ServoError::TrackLost { index: self.index }
    }
}

impl FeatureTracker<SimFrame> for SimTracker {
    fn init_track(&mut self, frame: &SimFrame, seed: Pt2) -> Result<(), ServoError> {
        let nearest = frame
            .centroids
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.map(|c| (i, (c - seed).norm())))
            .filter(|(_, d)| *d <= self.search_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1));

        let (i, _) = nearest.ok_or_else(|| self.lost())?;
        self.locked = Some(i);
        self.last = None;
        Ok(())
    }

    fn update(&mut self, frame: &SimFrame) -> Result<Pt2, ServoError> {
        let c = self
            .locked
            .and_then(|i| frame.centroids.get(i).copied().flatten())
            .ok_or_else(|| self.lost())?;
        if let Some(last) = self.last {
            if (c - last).norm() > self.max_jump {
                return Err(self.lost());
            }
        }
        self.last = Some(c);
        Ok(c)
    }
}
