//! Visual servoing on the simulated eye-in-hand rig.
//!
//! The camera starts away from the desired pose (square target of half-width
//! 5 cm seen fronto-parallel at 70 cm) and the loop drives it back.
//!
//! Run with: `RUST_LOG=info cargo run -p ibvs --example simulated_servo`

use anyhow::Result;
use ibvs::core::synthetic::target;
use ibvs::core::{rotation_distance, rxyz_from_rotation, translation_distance, Vec3};
use ibvs::prelude::*;
use ibvs::sim::{SimRig, SimSetup};

fn main() -> Result<()> {
    env_logger::init();

    let config = ServoConfig {
        lambda: 0.5,
        ..ServoConfig::default()
    };
    let desired = config.desired_pose();
    let start = target::perturb_pose(
        &desired,
        Vec3::new(0.03, -0.02, 0.08),
        Vec3::new(0.04, 0.03, 0.2),
    );

    println!("=== IBVS on a simulated rig ===\n");
    println!(
        "Start offset: {:.1} mm, {:.2} deg",
        translation_distance(&start, &desired) * 1e3,
        rotation_distance(&start, &desired).to_degrees()
    );

    let rig = SimRig::new(SimSetup::from_config(&config, start, 0.1));
    let mut servo = ServoLoop::new(
        &config,
        rig.camera(),
        rig.trackers(),
        rig.robot(),
        SessionLog::new(Vec::new()),
    )?;

    let init = servo.initialize(&rig.seeds())?;
    println!(
        "Cold start: seed {:?}, candidates {:?}",
        init.seed,
        init.candidates
            .iter()
            .map(|c| (c.method, c.residual))
            .collect::<Vec<_>>()
    );

    for block in 0..10 {
        let summary = servo.run(&[], Some(20))?;
        log::info!("block {block}: {summary:?}");
        let truth = rig.true_pose();
        println!(
            "after {:4} cycles: |e| = {:.3e}, offset {:.3} mm / {:.4} deg",
            servo.cycles(),
            summary.final_error_norm.unwrap_or_default(),
            translation_distance(&truth, &desired) * 1e3,
            rotation_distance(&truth, &desired).to_degrees()
        );
    }

    let pose = rig.true_pose();
    let r = rxyz_from_rotation(&pose.rotation);
    println!(
        "\nFinal cMo: t = ({:.4}, {:.4}, {:.4}) m, rxyz = ({:.4}, {:.4}, {:.4}) rad",
        pose.translation.x, pose.translation.y, pose.translation.z, r.rx, r.ry, r.rz
    );
    println!("Session log: {} lines", servo.log().lines());
    Ok(())
}
