use chrono::{DateTime, Utc};
use scoreloop_agent::AgentOutput;
use scoreloop_evidence::EvidenceSummary;
use scoreloop_quality::{Assessment, Dimension, IterationPrompts, PreviousIteration, QualityBand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Shared context for the scoring loop
#[derive(Debug, Clone)]
pub struct LoopContext {
    /// Original task prompt
    pub task: String,
    /// Working directory handed to the engine
    pub working_dir: PathBuf,
    /// Current iteration number (0-indexed)
    pub iteration: usize,
    /// History of all completed iterations
    pub history: Vec<IterationRecord>,
    started_at: Instant,
}

/// Record of a single completed iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    /// Zero-based iteration index
    pub index: usize,
    pub score: f64,
    pub passed: bool,
    pub band: QualityBand,
    pub improvements: Vec<String>,
    pub dimension_scores: BTreeMap<Dimension, f64>,
    pub evidence: EvidenceSummary,
    pub duration_secs: f64,
    /// Hook events the engine emitted
    pub event_count: usize,
    pub denied_count: usize,
    pub timestamp: DateTime<Utc>,
}

impl IterationRecord {
    pub fn new(
        index: usize,
        assessment: Assessment,
        evidence: EvidenceSummary,
        output: &AgentOutput,
        duration: Duration,
    ) -> Self {
        Self {
            index,
            score: assessment.score,
            passed: assessment.passed,
            band: assessment.band,
            improvements: assessment.improvements_needed,
            dimension_scores: assessment.dimension_scores,
            evidence,
            duration_secs: duration.as_secs_f64(),
            event_count: output.event_count,
            denied_count: output.denied_count,
            timestamp: Utc::now(),
        }
    }
}

impl LoopContext {
    pub fn new(task: String, working_dir: PathBuf) -> Self {
        Self {
            task,
            working_dir,
            iteration: 0,
            history: Vec::new(),
            started_at: Instant::now(),
        }
    }

    pub fn increment_iteration(&mut self) {
        self.iteration += 1;
    }

    pub fn push_record(&mut self, record: IterationRecord) {
        self.history.push(record);
    }

    pub fn total_duration(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Scores of completed iterations, oldest first
    pub fn scores(&self) -> Vec<f64> {
        self.history.iter().map(|r| r.score).collect()
    }

    /// Score of the last completed iteration, 0 if none
    pub fn final_score(&self) -> f64 {
        self.history.last().map(|r| r.score).unwrap_or(0.0)
    }

    /// Get the prompt for the current iteration.
    /// The first iteration uses the task as-is; later ones fold in the
    /// previous score and improvements.
    pub fn current_prompt(&self) -> String {
        let previous = self.history.last().map(|last| PreviousIteration {
            score: last.score,
            improvements: &last.improvements,
            evidence: &last.evidence,
        });
        IterationPrompts::build_iteration_prompt(&self.task, self.iteration, previous)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoreloop_evidence::Evidence;
    use scoreloop_quality::{assess, ScoringConfig};

    fn record(index: usize, evidence: &Evidence) -> IterationRecord {
        IterationRecord::new(
            index,
            assess(evidence, &ScoringConfig::default()),
            evidence.summary(),
            &AgentOutput::default(),
            Duration::from_millis(10),
        )
    }

    #[test]
    fn test_first_prompt_is_task() {
        let context = LoopContext::new("Add a README".into(), PathBuf::from("."));
        assert_eq!(context.current_prompt(), "Add a README");
        assert_eq!(context.final_score(), 0.0);
    }

    #[test]
    fn test_follow_up_prompt_uses_last_record() {
        let mut context = LoopContext::new("Add a README".into(), PathBuf::from("."));
        context.push_record(record(0, &Evidence::default()));
        context.increment_iteration();

        let prompt = context.current_prompt();
        assert!(prompt.starts_with("Add a README\n\n---\nThis is iteration 2."));
        assert!(prompt.contains("scored 27.5/100"));
        assert!(prompt.contains("1. No code changes detected"));
        assert_eq!(context.scores(), vec![27.5]);
        assert_eq!(context.final_score(), 27.5);
    }

    #[test]
    fn test_record_serializes_band_and_dimensions() {
        let value = serde_json::to_value(record(0, &Evidence::default())).unwrap();
        assert_eq!(value["band"], "poor");
        assert_eq!(value["dimension_scores"]["tests_pass"], 50.0);
        assert_eq!(value["evidence"]["total_files_modified"], 0);
    }
}
