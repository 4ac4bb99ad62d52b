use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::{BrownConrady5, Camera, DistortionModel, FxFyCxCySkew, NoDistortion};
use crate::Real;

/// Lens distortion as it appears in configuration files.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistortionParams {
    #[default]
    None,
    /// Brown-Conrady 5-parameter radial-tangential model.
    BrownConrady5 {
        #[serde(flatten)]
        params: BrownConrady5<Real>,
    },
}

/// Pinhole camera parameters: pixel mapping plus optional lens distortion.
///
/// ```json
/// { "intrinsics": { "fx": 600, "fy": 600, "cx": 320, "cy": 240, "skew": 0 } }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CameraParams {
    pub intrinsics: FxFyCxCySkew<Real>,
    #[serde(default)]
    pub distortion: DistortionParams,
}

impl Default for CameraParams {
    /// 640x480 sensor with a 600 px focal length and no distortion.
    fn default() -> Self {
        Self::pinhole(600.0, 600.0, 320.0, 240.0)
    }
}

/// Runtime camera built from [`CameraParams`].
pub type CameraModel = Camera<Real, AnyDistortion, FxFyCxCySkew<Real>>;

impl CameraParams {
    /// Distortion-free camera without skew.
    pub fn pinhole(fx: Real, fy: Real, cx: Real, cy: Real) -> Self {
        Self {
            intrinsics: FxFyCxCySkew {
                fx,
                fy,
                cx,
                cy,
                skew: 0.0,
            },
            distortion: DistortionParams::None,
        }
    }

    pub fn with_distortion(mut self, params: BrownConrady5<Real>) -> Self {
        self.distortion = DistortionParams::BrownConrady5 { params };
        self
    }

    pub fn build(&self) -> CameraModel {
        let dist = match self.distortion {
            DistortionParams::None => AnyDistortion::None(NoDistortion),
            DistortionParams::BrownConrady5 { params } => AnyDistortion::BrownConrady5(params),
        };
        Camera::new(dist, self.intrinsics)
    }
}

#[derive(Clone, Debug)]
#[doc(hidden)]
pub enum AnyDistortion {
    None(NoDistortion),
    BrownConrady5(BrownConrady5<Real>),
}

impl DistortionModel<Real> for AnyDistortion {
    fn distort(&self, n: &Vector2<Real>) -> Vector2<Real> {
        match self {
            AnyDistortion::None(m) => m.distort(n),
            AnyDistortion::BrownConrady5(m) => m.distort(n),
        }
    }

    fn undistort(&self, n: &Vector2<Real>) -> Vector2<Real> {
        match self {
            AnyDistortion::None(m) => m.undistort(n),
            AnyDistortion::BrownConrady5(m) => m.undistort(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn default_camera_projects_through_principal_point() {
        let cam = CameraParams::default().build();
        let px = cam.project_point_c(&Vector3::new(0.1, 0.2, 1.0)).unwrap();
        assert!((px.x - 380.0).abs() < 1e-9);
        assert!((px.y - 360.0).abs() < 1e-9);
        let on_plane = Vector3::new(0.1, 0.2, 0.0);
        assert!(cam.project_point_c(&on_plane).is_none());
    }

    #[test]
    fn distortion_is_optional_in_json() {
        let cfg: CameraParams = serde_json::from_str(
            r#"{"intrinsics": {"fx": 800, "fy": 790, "cx": 330, "cy": 250, "skew": 0}}"#,
        )
        .unwrap();
        assert!(matches!(cfg.distortion, DistortionParams::None));
        assert_eq!(cfg.intrinsics.fy, 790.0);
    }

    #[test]
    fn brown_conrady_json_shape() {
        let json = r#"{
            "type": "brown_conrady5",
            "k1": 0.1,
            "k2": 0.01,
            "k3": 0.0,
            "p1": 0.0,
            "p2": 0.0,
            "iters": 4
        }"#;
        let cfg: DistortionParams = serde_json::from_str(json).unwrap();
        match cfg {
            DistortionParams::BrownConrady5 { params } => {
                assert!((params.k1 - 0.1).abs() < 1e-12);
                assert_eq!(params.iters, 4);
            }
            other => panic!("expected brown_conrady5, got {other:?}"),
        }
    }

    #[test]
    fn camera_params_json_roundtrip() {
        let params =
            CameraParams::pinhole(610.0, 605.0, 318.5, 242.0).with_distortion(BrownConrady5 {
                k1: -0.2,
                ..BrownConrady5::default()
            });
        let json = serde_json::to_string(&params).unwrap();
        let back: CameraParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back.intrinsics.cx, 318.5);
        assert!(matches!(
            back.distortion,
            DistortionParams::BrownConrady5 { params } if params.k1 == -0.2
        ));
    }
}
