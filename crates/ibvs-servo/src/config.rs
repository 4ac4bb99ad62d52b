//! Servo session configuration.

use crate::control::DEFAULT_RANK_TOLERANCE;
use crate::error::ServoError;
use crate::interaction::InteractionSource;
use ibvs_core::synthetic::target;
use ibvs_core::{pose_from_translation_rxyz, CameraParams, Iso3, Pt3, Real, Rxyz, Vec3};
use ibvs_optim::RefineOptions;
use serde::{Deserialize, Serialize};

/// Everything fixed at startup. Missing JSON fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    pub camera: CameraParams,
    /// Half-width `L` of the square target `(±L, ±L, 0)`, meters.
    pub target_half_width: Real,
    /// Desired `T_C_O` translation, meters.
    pub desired_translation: Vec3,
    /// Desired `T_C_O` rotation, radians.
    pub desired_rotation: Rxyz,
    /// Control gain λ.
    pub lambda: Real,
    pub interaction: InteractionSource,
    pub refine: RefineOptions,
    /// Relative singular value cut-off of the pseudo-inverse.
    pub rank_tolerance: Real,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            camera: CameraParams::default(),
            target_half_width: 0.05,
            desired_translation: Vec3::new(0.0, 0.0, 0.7),
            desired_rotation: Rxyz::default(),
            lambda: 0.1,
            interaction: InteractionSource::Current,
            refine: RefineOptions::default(),
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
        }
    }
}

impl ServoConfig {
    pub fn validate(&self) -> Result<(), ServoError> {
        if !(self.lambda.is_finite() && self.lambda > 0.0) {
            return Err(ServoError::Config(format!(
                "lambda must be positive, got {}",
                self.lambda
            )));
        }
        if !(self.target_half_width.is_finite() && self.target_half_width > 0.0) {
            return Err(ServoError::Config(format!(
                "target_half_width must be positive, got {}",
                self.target_half_width
            )));
        }
        if !(self.rank_tolerance.is_finite() && self.rank_tolerance >= 0.0) {
            return Err(ServoError::Config(format!(
                "rank_tolerance must be non-negative, got {}",
                self.rank_tolerance
            )));
        }
        if self.refine.max_iters == 0 {
            return Err(ServoError::Config("refine.max_iters must be > 0".into()));
        }
        Ok(())
    }

    pub fn desired_pose(&self) -> Iso3 {
        pose_from_translation_rxyz(self.desired_translation, &self.desired_rotation)
    }

    /// Target corners in tracker order.
    pub fn object_points(&self) -> Vec<Pt3> {
        target::square(self.target_half_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_reference_setup() {
        let cfg = ServoConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.lambda, 0.1);
        assert_eq!(cfg.object_points().len(), 4);
        let t = cfg.desired_pose().translation.vector;
        assert_eq!(t, Vec3::new(0.0, 0.0, 0.7));
        assert_eq!(cfg.interaction, InteractionSource::Current);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: ServoConfig =
            serde_json::from_str(r#"{"lambda": 0.4, "interaction": "mean"}"#).unwrap();
        assert_eq!(cfg.lambda, 0.4);
        assert_eq!(cfg.interaction, InteractionSource::Mean);
        assert_eq!(cfg.target_half_width, 0.05);
    }

    #[test]
    fn json_roundtrip() {
        let mut cfg = ServoConfig::default();
        cfg.desired_rotation = Rxyz::new(0.0, 0.1, 0.0);
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let back: ServoConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.desired_rotation, cfg.desired_rotation);
        assert_eq!(back.desired_translation, cfg.desired_translation);
    }

    #[test]
    fn rejects_bad_values() {
        let cfg = ServoConfig {
            lambda: -1.0,
            ..ServoConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ServoError::Config(_))));

        let cfg = ServoConfig {
            target_half_width: 0.0,
            ..ServoConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ServoError::Config(_))));
    }
}
