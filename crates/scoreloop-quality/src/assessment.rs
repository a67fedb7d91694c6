use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Coarse category derived from a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBand {
    Excellent,
    Good,
    Acceptable,
    NeedsWork,
    Poor,
}

impl QualityBand {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            QualityBand::Excellent
        } else if score >= 70.0 {
            QualityBand::Good
        } else if score >= 50.0 {
            QualityBand::Acceptable
        } else if score >= 30.0 {
            QualityBand::NeedsWork
        } else {
            QualityBand::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityBand::Excellent => "excellent",
            QualityBand::Good => "good",
            QualityBand::Acceptable => "acceptable",
            QualityBand::NeedsWork => "needs_work",
            QualityBand::Poor => "poor",
        }
    }
}

impl std::fmt::Display for QualityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The five scored aspects of an iteration, in scoring order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    CodeChanges,
    TestsRun,
    TestsPass,
    Coverage,
    NoErrors,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::CodeChanges,
        Dimension::TestsRun,
        Dimension::TestsPass,
        Dimension::Coverage,
        Dimension::NoErrors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::CodeChanges => "code_changes",
            Dimension::TestsRun => "tests_run",
            Dimension::TestsPass => "tests_pass",
            Dimension::Coverage => "coverage",
            Dimension::NoErrors => "no_errors",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring one evidence snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// 0..=100, one decimal place
    pub score: f64,
    pub passed: bool,
    pub band: QualityBand,
    /// At most five, most severe first
    pub improvements_needed: Vec<String>,
    pub dimension_scores: BTreeMap<Dimension, f64>,
}

impl Assessment {
    /// Score of a single dimension, 0 if it was not scored
    pub fn dimension(&self, dimension: Dimension) -> f64 {
        self.dimension_scores.get(&dimension).copied().unwrap_or(0.0)
    }

    pub fn is_critical(&self) -> bool {
        self.improvements_needed
            .first()
            .is_some_and(|s| s.starts_with("CRITICAL"))
    }
}

/// Progress between two consecutive assessments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentComparison {
    pub score_delta: f64,
    pub improved: bool,
    pub regressed: bool,
    /// Moved less than two points either way
    pub stagnant: bool,
    pub current_band: QualityBand,
    pub previous_band: QualityBand,
    pub band_changed: bool,
}
