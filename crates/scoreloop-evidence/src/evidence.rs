use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{CommandResult, FileChange, SubtaskRecord, TestResult, ToolInvocation};

/// Everything observed during one iteration of the agent
///
/// Per-iteration lists are append-only; aggregates are computed on demand so
/// any interleaving of record calls yields consistent counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub files_written: Vec<String>,
    pub files_edited: Vec<String>,
    pub files_read: Vec<String>,
    pub file_changes: Vec<FileChange>,

    pub commands_run: Vec<CommandResult>,

    pub tests_run: bool,
    pub test_results: Vec<TestResult>,

    pub subtasks_spawned: u32,
    pub subtask_results: Vec<SubtaskRecord>,

    pub tool_invocations: Vec<ToolInvocation>,

    // Session-level, survives reset
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Flat summary of an evidence snapshot, used in iteration records and logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSummary {
    pub files_written: Vec<String>,
    pub files_edited: Vec<String>,
    pub files_read: Vec<String>,
    pub total_files_modified: usize,
    pub commands_run: usize,
    pub tests_run: bool,
    pub tests_passed: u64,
    pub tests_failed: u64,
    pub all_tests_passing: bool,
    pub subtasks_spawned: u32,
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Default for Evidence {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl Evidence {
    pub fn new(session_id: String) -> Self {
        Self {
            files_written: Vec::new(),
            files_edited: Vec::new(),
            files_read: Vec::new(),
            file_changes: Vec::new(),
            commands_run: Vec::new(),
            tests_run: false,
            test_results: Vec::new(),
            subtasks_spawned: 0,
            subtask_results: Vec::new(),
            tool_invocations: Vec::new(),
            session_id,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    /// Clear per-iteration state, keeping session id and start time
    pub fn clear_iteration(&mut self) {
        self.files_written.clear();
        self.files_edited.clear();
        self.files_read.clear();
        self.file_changes.clear();
        self.commands_run.clear();
        self.tests_run = false;
        self.test_results.clear();
        self.subtasks_spawned = 0;
        self.subtask_results.clear();
        self.tool_invocations.clear();
        self.end_time = None;
    }

    /// Distinct paths written or edited. Reads never count.
    pub fn total_files_modified(&self) -> usize {
        self.files_written
            .iter()
            .chain(self.files_edited.iter())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn has_code_changes(&self) -> bool {
        !self.files_written.is_empty() || !self.files_edited.is_empty()
    }

    pub fn total_tests_passed(&self) -> u64 {
        self.test_results.iter().map(|r| u64::from(r.passed)).sum()
    }

    pub fn total_tests_failed(&self) -> u64 {
        self.test_results.iter().map(|r| u64::from(r.failed)).sum()
    }

    pub fn total_test_errors(&self) -> u64 {
        self.test_results.iter().map(|r| u64::from(r.errors)).sum()
    }

    /// True only when tests ran, something passed and nothing failed
    pub fn all_tests_passing(&self) -> bool {
        self.tests_run && self.total_tests_failed() == 0 && self.total_tests_passed() > 0
    }

    /// Mean of the positive coverage figures reported this iteration
    pub fn average_coverage(&self) -> Option<f64> {
        let figures: Vec<f64> = self
            .test_results
            .iter()
            .filter_map(|r| r.coverage_percent)
            .filter(|c| *c > 0.0)
            .collect();

        if figures.is_empty() {
            None
        } else {
            Some(figures.iter().sum::<f64>() / figures.len() as f64)
        }
    }

    pub fn summary(&self) -> EvidenceSummary {
        EvidenceSummary {
            files_written: self.files_written.clone(),
            files_edited: self.files_edited.clone(),
            files_read: self.files_read.clone(),
            total_files_modified: self.total_files_modified(),
            commands_run: self.commands_run.len(),
            tests_run: self.tests_run,
            tests_passed: self.total_tests_passed(),
            tests_failed: self.total_tests_failed(),
            all_tests_passing: self.all_tests_passing(),
            subtasks_spawned: self.subtasks_spawned,
            session_id: self.session_id.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TestFramework, TestResult};

    #[test]
    fn test_total_files_modified_counts_distinct_paths() {
        let mut evidence = Evidence::default();
        evidence.files_written.push("src/a.rs".into());
        evidence.files_edited.push("src/a.rs".into());
        evidence.files_edited.push("src/b.rs".into());
        evidence.files_read.push("src/c.rs".into());

        assert_eq!(evidence.total_files_modified(), 2);
        assert!(evidence.has_code_changes());
    }

    #[test]
    fn test_all_tests_passing_requires_a_pass() {
        let mut evidence = Evidence::default();
        assert!(!evidence.all_tests_passing());

        evidence.tests_run = true;
        evidence
            .test_results
            .push(TestResult::new(TestFramework::Cargo));
        assert!(!evidence.all_tests_passing());

        evidence.test_results[0].passed = 3;
        assert!(evidence.all_tests_passing());
    }

    #[test]
    fn test_totals_do_not_overflow_u32() {
        let mut evidence = Evidence::default();
        evidence.tests_run = true;
        evidence.test_results.push(TestResult::new(TestFramework::Cargo).with_counts(u32::MAX, 0));
        evidence.test_results.push(TestResult::new(TestFramework::Cargo).with_counts(1, u32::MAX));

        assert_eq!(evidence.total_tests_passed(), u64::from(u32::MAX) + 1);
        assert_eq!(evidence.total_tests_failed(), u64::from(u32::MAX));
        assert_eq!(evidence.summary().tests_passed, 4_294_967_296);
    }

    #[test]
    fn test_average_coverage_ignores_missing_and_zero() {
        let mut evidence = Evidence::default();
        evidence.test_results.push(TestResult::new(TestFramework::Go).with_coverage(60.0));
        evidence.test_results.push(TestResult::new(TestFramework::Go).with_coverage(0.0));
        evidence.test_results.push(TestResult::new(TestFramework::Go));
        evidence.test_results.push(TestResult::new(TestFramework::Go).with_coverage(90.0));

        assert_eq!(evidence.average_coverage(), Some(75.0));
    }

    #[test]
    fn test_summary_serializes_total_files_modified() {
        let mut evidence = Evidence::default();
        for path in ["a.py", "b.py", "a.py"] {
            evidence.files_written.push(path.into());
        }
        evidence.files_edited.push("c.py".into());

        let value = serde_json::to_value(evidence.summary()).unwrap();
        assert_eq!(value["total_files_modified"], 3);

        let back: EvidenceSummary = serde_json::from_value(value).unwrap();
        assert_eq!(back.total_files_modified, evidence.total_files_modified());
    }
}
