use scoreloop_evidence::EvidenceSummary;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{IterationRecord, TerminationReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    Success,
    Terminated,
}

/// The final outcome of a loop run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopOutcome {
    pub status: LoopStatus,
    pub reason: TerminationReason,
    /// Score of the last completed iteration, 0 if none completed
    pub final_score: f64,
    pub iteration_count: usize,
    pub history: Vec<IterationRecord>,
    pub total_duration_secs: f64,
    /// Evidence of the last completed iteration
    pub evidence_summary: Option<EvidenceSummary>,
    /// Engine error text when `reason` is `error`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoopOutcome {
    pub fn new(reason: TerminationReason, history: Vec<IterationRecord>, duration: Duration) -> Self {
        let status = if reason.is_success() {
            LoopStatus::Success
        } else {
            LoopStatus::Terminated
        };
        let last = history.last();

        Self {
            status,
            reason,
            final_score: last.map(|r| r.score).unwrap_or(0.0),
            iteration_count: history.len(),
            evidence_summary: last.map(|r| r.evidence.clone()),
            history,
            total_duration_secs: duration.as_secs_f64(),
            error: None,
        }
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == LoopStatus::Success
    }

    pub fn exit_code(&self) -> i32 {
        self.reason.exit_code()
    }

    pub fn scores(&self) -> Vec<f64> {
        self.history.iter().map(|r| r.score).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_history_scores_zero() {
        let outcome = LoopOutcome::new(TerminationReason::Error, Vec::new(), Duration::ZERO)
            .with_error("engine crashed".into());
        assert_eq!(outcome.final_score, 0.0);
        assert_eq!(outcome.iteration_count, 0);
        assert_eq!(outcome.status, LoopStatus::Terminated);
        assert!(outcome.evidence_summary.is_none());
        assert_eq!(outcome.exit_code(), 2);
    }

    #[test]
    fn test_only_quality_met_is_success() {
        let success =
            LoopOutcome::new(TerminationReason::QualityThresholdMet, Vec::new(), Duration::ZERO);
        assert!(success.is_success());

        for reason in [
            TerminationReason::MaxIterationsReached,
            TerminationReason::OscillationDetected,
            TerminationReason::StagnationDetected,
            TerminationReason::TimeoutExceeded,
            TerminationReason::UserCancelled,
        ] {
            assert!(!LoopOutcome::new(reason, Vec::new(), Duration::ZERO).is_success());
        }
    }

    #[test]
    fn test_serialized_shape() {
        let outcome = LoopOutcome::new(
            TerminationReason::StagnationDetected,
            Vec::new(),
            Duration::from_millis(2500),
        );
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "terminated");
        assert_eq!(value["reason"], "stagnation_detected");
        assert_eq!(value["total_duration_secs"], 2.5);
        assert!(value.get("error").is_none());
    }
}
