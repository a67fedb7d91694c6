use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::LoopConfig;

/// Why a loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    QualityThresholdMet,
    MaxIterationsReached,
    OscillationDetected,
    StagnationDetected,
    TimeoutExceeded,
    UserCancelled,
    Error,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QualityThresholdMet => "quality_threshold_met",
            Self::MaxIterationsReached => "max_iterations_reached",
            Self::OscillationDetected => "oscillation_detected",
            Self::StagnationDetected => "stagnation_detected",
            Self::TimeoutExceeded => "timeout_exceeded",
            Self::UserCancelled => "user_cancelled",
            Self::Error => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::QualityThresholdMet)
    }

    /// Process exit code a front end should use
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::QualityThresholdMet => 0,
            Self::MaxIterationsReached
            | Self::OscillationDetected
            | Self::StagnationDetected
            | Self::TimeoutExceeded => 1,
            Self::Error => 2,
            Self::UserCancelled => 130,
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scores swinging up and down by more than `threshold` inside the last
/// `window` scores.
pub fn is_oscillating(scores: &[f64], window: usize, threshold: f64) -> bool {
    if window < 3 || scores.len() < window {
        return false;
    }

    let recent = &scores[scores.len() - window..];
    let deltas: Vec<f64> = recent.windows(2).map(|w| w[1] - w[0]).collect();

    deltas.windows(2).any(|d| {
        (d[0] > threshold && d[1] < -threshold) || (d[0] < -threshold && d[1] > threshold)
    })
}

/// Latest gain below `min_improvement` (any regression included), or the last
/// two scores within `variance_threshold` of each other.
pub fn is_stagnating(scores: &[f64], min_improvement: f64, variance_threshold: f64) -> bool {
    let [.., previous, latest] = scores else {
        return false;
    };

    let delta = latest - previous;
    if delta < min_improvement {
        return true;
    }

    let range = latest.max(*previous) - latest.min(*previous);
    range < variance_threshold
}

/// Evaluate the stop conditions after an iteration, first match wins:
/// quality met, oscillation, stagnation, overall timeout (strictly exceeded).
pub fn check_termination(
    scores: &[f64],
    passed: bool,
    config: &LoopConfig,
    elapsed: Duration,
) -> Option<TerminationReason> {
    if passed {
        return Some(TerminationReason::QualityThresholdMet);
    }
    if is_oscillating(scores, config.oscillation_window, config.oscillation_threshold) {
        return Some(TerminationReason::OscillationDetected);
    }
    if is_stagnating(scores, config.min_improvement, config.stagnation_threshold) {
        return Some(TerminationReason::StagnationDetected);
    }
    if config.timeout().is_some_and(|limit| elapsed > limit) {
        return Some(TerminationReason::TimeoutExceeded);
    }
    None
}
