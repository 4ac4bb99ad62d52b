use crate::pose::PoseError;
use ibvs_core::Real;
use thiserror::Error;

/// Whether an error invalidates the whole servo session or only the cycle
/// in which it was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScope {
    /// Setup or resource failure; the session cannot continue.
    Process,
    /// Failure inside one TRACKING cycle; the loop stops after a safe stop.
    Cycle,
}

/// Errors raised by the servo pipeline.
#[derive(Debug, Error)]
pub enum ServoError {
    #[error("degenerate pose configuration: {0}")]
    DegenerateConfiguration(#[from] PoseError),
    #[error("tracker {index} lost its feature")]
    TrackLost { index: usize },
    #[error("feature {index} has invalid depth {depth}")]
    InvalidDepth { index: usize, depth: Real },
    #[error("actuator fault: {0}")]
    ActuatorFault(String),
    #[error("feature count mismatch: {current} current vs {desired} desired")]
    FeatureMismatch { current: usize, desired: usize },
    #[error("frame acquisition failed: {0}")]
    Acquisition(String),
    #[error("session log write failed: {0}")]
    Log(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("servo loop stepped before initialization")]
    NotInitialized,
}

impl ServoError {
    pub fn scope(&self) -> ErrorScope {
        match self {
            ServoError::DegenerateConfiguration(_)
            | ServoError::FeatureMismatch { .. }
            | ServoError::Log(_)
            | ServoError::Config(_)
            | ServoError::NotInitialized => ErrorScope::Process,
            ServoError::TrackLost { .. }
            | ServoError::InvalidDepth { .. }
            | ServoError::ActuatorFault(_)
            | ServoError::Acquisition(_) => ErrorScope::Cycle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes() {
        assert_eq!(
            ServoError::TrackLost { index: 2 }.scope(),
            ErrorScope::Cycle
        );
        assert_eq!(
            ServoError::ActuatorFault("estop".into()).scope(),
            ErrorScope::Cycle
        );
        assert_eq!(
            ServoError::from(PoseError::DegeneratePoints).scope(),
            ErrorScope::Process
        );
        assert_eq!(
            ServoError::FeatureMismatch {
                current: 3,
                desired: 4
            }
            .scope(),
            ErrorScope::Process
        );
    }

    #[test]
    fn messages_name_the_feature() {
        let err = ServoError::InvalidDepth {
            index: 3,
            depth: -0.5,
        };
        assert_eq!(err.to_string(), "feature 3 has invalid depth -0.5");
        assert_eq!(
            ServoError::TrackLost { index: 1 }.to_string(),
            "tracker 1 lost its feature"
        );
    }
}
