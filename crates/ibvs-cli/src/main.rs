use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use ibvs_core::synthetic::noise::FrameJitter;
use ibvs_core::synthetic::target;
use ibvs_core::{rotation_distance, rxyz_from_rotation, translation_distance, Rxyz, Vec3};
use ibvs_servo::sim::{SimRig, SimSetup};
use ibvs_servo::{ServoConfig, ServoLoop, SessionLog};
use log::info;
use serde::Serialize;

/// Run the visual servoing loop on the simulated eye-in-hand rig.
#[derive(Debug, Parser)]
#[command(author, version, about = "Simulated image-based visual servoing")]
struct Args {
    /// Optional path to a JSON ServoConfig. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of TRACKING cycles to run.
    #[arg(long, default_value_t = 200)]
    cycles: usize,

    /// Session log output (one line per cycle).
    #[arg(long, default_value = "servo.log")]
    log: PathBuf,

    /// Control period in seconds.
    #[arg(long, default_value_t = 0.04)]
    dt: f64,

    /// Start pose offset from the desired pose: tx,ty,tz (m), rx,ry,rz (rad).
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = [0.0; 6]
    )]
    initial_offset: Vec<f64>,

    /// Uniform centroid noise amplitude in pixels.
    #[arg(long, default_value_t = 0.0)]
    noise: f64,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

#[derive(Debug, Serialize)]
struct RunReport {
    cycles: usize,
    stop_reason: String,
    final_error_norm: Option<f64>,
    /// Estimated target pose in the camera frame.
    final_translation: Option<[f64; 3]>,
    final_rotation: Option<Rxyz>,
    /// Distance of the true camera pose from the desired one.
    translation_offset: f64,
    rotation_offset: f64,
    log_lines: usize,
    log_path: PathBuf,
}

fn load_config(path: Option<&Path>) -> Result<ServoConfig> {
    let Some(path) = path else {
        return Ok(ServoConfig::default());
    };
    let data =
        fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    let config: ServoConfig = serde_json::from_str(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Run the simulated loop; setting `stop` ends it cleanly before the next cycle.
fn run_simulation(args: &Args, config: &ServoConfig, stop: Arc<AtomicBool>) -> Result<RunReport> {
    ensure!(args.dt > 0.0, "--dt must be positive, got {}", args.dt);
    ensure!(
        args.initial_offset.len() == 6,
        "--initial-offset needs 6 values, got {}",
        args.initial_offset.len()
    );

    let o = &args.initial_offset;
    let desired = config.desired_pose();
    let start = target::perturb_pose(
        &desired,
        Vec3::new(o[0], o[1], o[2]),
        Vec3::new(o[3], o[4], o[5]),
    );

    let mut setup = SimSetup::from_config(config, start, args.dt);
    if args.noise > 0.0 {
        setup = setup.with_noise(FrameJitter::new(0x1b5, args.noise));
    }
    let rig = SimRig::new(setup);

    let log = SessionLog::create(&args.log)
        .with_context(|| format!("creating session log {}", args.log.display()))?;
    let mut servo = ServoLoop::new(config, rig.camera(), rig.trackers(), rig.robot(), log)?
        .with_stop_flag(stop);

    let summary = servo.run(&rig.seeds(), Some(args.cycles))?;
    let truth = rig.true_pose();
    info!(
        "true pose offset: {:.3e} m, {:.3e} rad",
        translation_distance(&truth, &desired),
        rotation_distance(&truth, &desired)
    );

    Ok(RunReport {
        cycles: summary.cycles,
        stop_reason: format!("{:?}", summary.stop_reason),
        final_error_norm: summary.final_error_norm,
        final_translation: summary.final_pose.map(|p| {
            let t = p.translation.vector;
            [t.x, t.y, t.z]
        }),
        final_rotation: summary.final_pose.map(|p| rxyz_from_rotation(&p.rotation)),
        translation_offset: translation_distance(&truth, &desired),
        rotation_offset: rotation_distance(&truth, &desired),
        log_lines: servo.log().lines(),
        log_path: args.log.clone(),
    })
}

fn main() {
    env_logger::init();
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))
        .context("installing Ctrl-C handler")?;

    let report = run_simulation(&args, &config, stop)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    fn no_stop() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["ibvs"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn parses_initial_offset() {
        let a = args(&[
            "--initial-offset",
            "0.01,-0.02,0.03,0,0,-0.1",
            "--cycles",
            "5",
        ]);
        assert_eq!(a.initial_offset, vec![0.01, -0.02, 0.03, 0.0, 0.0, -0.1]);
        assert_eq!(a.cycles, 5);
        assert_eq!(args(&[]).initial_offset, vec![0.0; 6]);
    }

    #[test]
    fn simulated_run_writes_log() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("run.log");
        let a = args(&[
            "--cycles",
            "8",
            "--log",
            log_path.to_str().unwrap(),
            "--initial-offset",
            "0.005,0,0,0,0,0.02",
        ]);

        let report = run_simulation(&a, &ServoConfig::default(), no_stop()).unwrap();
        assert_eq!(report.cycles, 8);
        assert_eq!(report.log_lines, 8);

        let text = fs::read_to_string(&log_path).unwrap();
        assert_eq!(text.lines().count(), 8);
        assert!(text.lines().all(|l| l.split(' ').count() == 32));
    }

    #[test]
    fn interrupt_stops_before_the_next_cycle() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("interrupted.log");
        let a = args(&["--cycles", "50", "--log", log_path.to_str().unwrap()]);

        let stop = no_stop();
        stop.store(true, Ordering::SeqCst);
        let report = run_simulation(&a, &ServoConfig::default(), stop).unwrap();
        assert_eq!(report.stop_reason, "StopRequested");
        assert_eq!(report.cycles, 0);
        assert!(log_path.exists());
        assert_eq!(fs::read_to_string(&log_path).unwrap().lines().count(), 0);
    }

    #[test]
    fn config_file_overrides_defaults() {
        let file = NamedTempFile::new().unwrap();
        let json = r#"{"lambda": 0.25, "target_half_width": 0.04}"#;
        fs::write(file.path(), json).unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.lambda, 0.25);
        assert_eq!(config.target_half_width, 0.04);
    }

    #[test]
    fn invalid_config_is_reported() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), r#"{"lambda": -1.0}"#).unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("lambda"), "{err}");

        fs::write(file.path(), "not json").unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"), "{err:#}");
    }
}
