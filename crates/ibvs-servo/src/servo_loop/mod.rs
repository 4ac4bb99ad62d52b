//! The perception-control loop.
//!
//! `INITIALIZING` runs once: acquire a frame, lock one tracker per object
//! point, and compute a cold-start pose. Each `TRACKING` cycle then runs
//! acquire → track → warm-start pose → features → control law → actuate →
//! read back → log, strictly in that order. Any cycle error stops the loop;
//! if the robot was already moving it is sent a zero twist first.

mod io;
mod session_log;

pub use self::io::{Actuator, FeatureTracker, FrameSource, VelocityFrame};
pub use self::session_log::{CycleRecord, SessionLog};

use crate::config::ServoConfig;
use crate::control::{compute_control_law, ServoTask};
use crate::error::ServoError;
use crate::features::{current_features, features_from_pose, FeatureAdapter};
use crate::pose::{PoseEstimate, PoseEstimator, PoseMode};
use ibvs_core::{Iso3, Pt2, Pt3, Real, Vec6};
use log::{debug, info, warn};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Initializing,
    Tracking,
}

/// Why [`ServoLoop::run`] returned normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    CycleBudget,
    StopRequested,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    /// TRACKING cycles completed by this run.
    pub cycles: usize,
    pub final_pose: Option<Iso3>,
    pub final_error_norm: Option<Real>,
    pub stop_reason: StopReason,
}

pub struct ServoLoop<S, T, A, W>
where
    S: FrameSource,
    T: FeatureTracker<S::Frame>,
    A: Actuator,
    W: Write,
{
    source: S,
    trackers: Vec<T>,
    actuator: A,
    log: SessionLog<W>,
    adapter: FeatureAdapter,
    object: Vec<Pt3>,
    task: ServoTask,
    estimator: PoseEstimator,
    state: LoopState,
    pose: Option<Iso3>,
    stop: Arc<AtomicBool>,
    moving: bool,
    cycles: usize,
    last_error_norm: Option<Real>,
}

impl<S, T, A, W> ServoLoop<S, T, A, W>
where
    S: FrameSource,
    T: FeatureTracker<S::Frame>,
    A: Actuator,
    W: Write,
{
    /// One tracker per object point, in the same order.
    pub fn new(
        config: &ServoConfig,
        source: S,
        trackers: Vec<T>,
        actuator: A,
        log: SessionLog<W>,
    ) -> Result<Self, ServoError> {
        config.validate()?;
        let object = config.object_points();
        if trackers.len() != object.len() {
            return Err(ServoError::FeatureMismatch {
                current: trackers.len(),
                desired: object.len(),
            });
        }

        let desired = features_from_pose(&config.desired_pose(), &object);
        let task = ServoTask::new(desired, config.lambda)?
            .with_source(config.interaction)
            .with_rank_tolerance(config.rank_tolerance);

        Ok(Self {
            source,
            trackers,
            actuator,
            log,
            adapter: FeatureAdapter::new(&config.camera),
            object,
            task,
            estimator: PoseEstimator::new(config.refine),
            state: LoopState::Initializing,
            pose: None,
            stop: Arc::new(AtomicBool::new(false)),
            moving: false,
            cycles: 0,
            last_error_norm: None,
        })
    }

    /// Use an externally owned stop flag, e.g. one set from a signal handler.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    /// Shared flag; setting it stops the loop before the next cycle.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn pose(&self) -> Option<&Iso3> {
        self.pose.as_ref()
    }

    pub fn task(&self) -> &ServoTask {
        &self.task
    }

    pub fn cycles(&self) -> usize {
        self.cycles
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn log(&self) -> &SessionLog<W> {
        &self.log
    }

    pub fn into_log(self) -> SessionLog<W> {
        self.log
    }

    /// INITIALIZING: lock trackers on `seeds` (pixels, one per object point)
    /// and compute the cold-start pose.
    pub fn initialize(&mut self, seeds: &[Pt2]) -> Result<PoseEstimate, ServoError> {
        if seeds.len() != self.trackers.len() {
            return Err(ServoError::FeatureMismatch {
                current: seeds.len(),
                desired: self.trackers.len(),
            });
        }

        let frame = self.source.acquire()?;
        let mut centroids = Vec::with_capacity(seeds.len());
        for (tracker, seed) in self.trackers.iter_mut().zip(seeds) {
            tracker.init_track(&frame, *seed)?;
            centroids.push(tracker.update(&frame)?);
        }

        let measured = self.adapter.normalize_all(&centroids);
        let estimate = self
            .estimator
            .estimate_pose(&self.object, &measured, &PoseMode::ColdStart)?;
        info!(
            "initialized from {:?} seed, residual {:.3e}",
            estimate.seed, estimate.residual
        );

        self.pose = Some(estimate.pose);
        self.state = LoopState::Tracking;
        Ok(estimate)
    }

    /// One TRACKING cycle.
    pub fn step(&mut self) -> Result<CycleRecord, ServoError> {
        let previous = match (self.state, self.pose) {
            (LoopState::Tracking, Some(pose)) => pose,
            _ => return Err(ServoError::NotInitialized),
        };

        let frame = self.source.acquire()?;
        let centroids = self
            .trackers
            .iter_mut()
            .map(|t| t.update(&frame))
            .collect::<Result<Vec<_>, _>>()?;
        let measured = self.adapter.normalize_all(&centroids);

        let mode = PoseMode::WarmStart(previous);
        let estimate = self
            .estimator
            .estimate_pose(&self.object, &measured, &mode)?;
        let current = current_features(&measured, &estimate.pose, &self.object);
        let snapshot = self.task.snapshot(&current)?;
        let out = compute_control_law(&snapshot);

        self.moving = true;
        self.actuator.set_velocity(VelocityFrame::Camera, &out.velocity)?;
        let joint_velocity = self.actuator.get_velocity(VelocityFrame::Articular)?;
        let joint_position = self.actuator.get_position(VelocityFrame::Articular)?;

        let record = CycleRecord {
            velocity: out.velocity,
            joint_velocity,
            joint_position,
            error: out.error,
            pose: estimate.pose,
        };
        self.log.write_record(&record)?;

        self.pose = Some(estimate.pose);
        self.cycles += 1;
        self.last_error_norm = Some(out.error_norm);
        debug!(
            "cycle {}: |e| = {:.3e}, |v| = {:.3e}, rank {}",
            self.cycles,
            out.error_norm,
            out.velocity.norm(),
            out.rank
        );
        Ok(record)
    }

    /// Initialize if needed, then cycle until the stop flag is set or
    /// `max_cycles` cycles have run (unbounded when `None`).
    pub fn run(
        &mut self,
        seeds: &[Pt2],
        max_cycles: Option<usize>,
    ) -> Result<RunSummary, ServoError> {
        if self.state == LoopState::Initializing {
            self.initialize(seeds)?;
        }

        let mut done = 0usize;
        let stop_reason = loop {
            if self.stop.load(Ordering::SeqCst) {
                break StopReason::StopRequested;
            }
            if max_cycles.is_some_and(|m| done >= m) {
                break StopReason::CycleBudget;
            }
            if let Err(err) = self.step() {
                warn!("cycle {} failed: {err}", self.cycles + 1);
                self.safe_stop();
                if let Err(flush_err) = self.log.flush() {
                    warn!("session log flush failed: {flush_err}");
                }
                return Err(err);
            }
            done += 1;
        };

        self.safe_stop();
        self.log.flush()?;
        info!(
            "servo stopped ({stop_reason:?}) after {done} cycles, |e| = {:?}",
            self.last_error_norm
        );

        Ok(RunSummary {
            cycles: done,
            final_pose: self.pose,
            final_error_norm: self.last_error_norm,
            stop_reason,
        })
    }

    /// Best-effort zero twist once the robot has been commanded.
    fn safe_stop(&mut self) {
        if !self.moving {
            return;
        }
        match self
            .actuator
            .set_velocity(VelocityFrame::Camera, &Vec6::zeros())
        {
            Ok(()) => self.moving = false,
            Err(err) => warn!("safe stop failed: {err}"),
        }
    }
}
