use serde::{Deserialize, Serialize};

use crate::Dimension;

/// Relative weight of each scoring dimension.
///
/// Callers are expected to keep the five weights summing to 1.0. This is not
/// enforced; see [`DimensionWeights::is_normalized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DimensionWeights {
    pub code_changes: f64,
    pub tests_run: f64,
    pub tests_pass: f64,
    pub coverage: f64,
    pub no_errors: f64,
}

impl Default for DimensionWeights {
    fn default() -> Self {
        Self {
            code_changes: 0.30,
            tests_run: 0.25,
            tests_pass: 0.25,
            coverage: 0.10,
            no_errors: 0.10,
        }
    }
}

impl DimensionWeights {
    pub fn weight(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::CodeChanges => self.code_changes,
            Dimension::TestsRun => self.tests_run,
            Dimension::TestsPass => self.tests_pass,
            Dimension::Coverage => self.coverage,
            Dimension::NoErrors => self.no_errors,
        }
    }

    pub fn sum(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.weight(*d)).sum()
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-6
    }
}

/// Inputs to [`assess`](crate::assess)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    pub weights: DimensionWeights,
    /// Coverage percentage that earns full coverage credit
    pub min_coverage: f64,
    /// Score at or above which an assessment passes
    pub quality_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: DimensionWeights::default(),
            min_coverage: 80.0,
            quality_threshold: 70.0,
        }
    }
}

impl ScoringConfig {
    pub fn with_weights(mut self, weights: DimensionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_min_coverage(mut self, min_coverage: f64) -> Self {
        self.min_coverage = min_coverage;
        self
    }

    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }
}
