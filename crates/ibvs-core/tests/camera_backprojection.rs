//! The camera model must map pixels back onto the viewing rays of the
//! points that produced them, with and without lens distortion.

use ibvs_core::{BrownConrady5, CameraParams, Pt3, Vec2};

fn distorted_params() -> CameraParams {
    CameraParams::pinhole(610.0, 605.0, 318.5, 242.0).with_distortion(BrownConrady5 {
        k1: -0.25,
        k2: 0.08,
        k3: 0.0,
        p1: 0.0008,
        p2: -0.0006,
        iters: 10,
    })
}

#[test]
fn pixels_backproject_onto_point_rays() {
    for params in [CameraParams::default(), distorted_params()] {
        let camera = params.build();
        let points = [
            Pt3::new(0.0, 0.0, 0.7),
            Pt3::new(0.05, 0.05, 0.7),
            Pt3::new(-0.08, 0.03, 0.6),
            Pt3::new(0.12, -0.09, 0.9),
        ];

        for p in points {
            let px = camera.project_point(&p).expect("point in front of camera");
            let ray = camera.backproject_pixel(&px);
            let expected = p.coords.normalize();
            assert!(
                (ray.dir - expected).norm() < 1e-9,
                "ray mismatch for {p:?}: {:?} vs {:?}",
                ray.dir,
                expected
            );

            let n = camera.pixel_to_normalized(&px);
            assert!((n - Vec2::new(p.x / p.z, p.y / p.z)).norm() < 1e-9);
        }
    }
}

#[test]
fn points_behind_the_camera_do_not_project() {
    let camera = distorted_params().build();
    assert!(camera.project_point(&Pt3::new(0.0, 0.0, -1.0)).is_none());
    assert!(camera.project_point(&Pt3::new(0.1, 0.0, 0.0)).is_none());
}
