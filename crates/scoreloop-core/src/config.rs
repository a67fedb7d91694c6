//! Loop configuration and `scoreloop.toml` support.

use anyhow::{Context, Result};
use scoreloop_quality::{DimensionWeights, ScoringConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::LoopError;

/// Upper bound on iterations regardless of configuration
pub const HARD_MAX_ITERATIONS: usize = 5;

/// The config file name
pub const CONFIG_FILE_NAME: &str = "scoreloop.toml";

/// Loop tuning. Every field is optional in `scoreloop.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoopConfig {
    /// Requested iterations, capped at [`HARD_MAX_ITERATIONS`]
    pub max_iterations: usize,
    pub quality_threshold: f64,
    /// Smallest score gain that counts as progress
    pub min_improvement: f64,
    pub oscillation_window: usize,
    /// Smallest swing that counts as a direction change
    pub oscillation_threshold: f64,
    /// Score range below which the loop is considered stuck
    pub stagnation_threshold: f64,
    /// Overall budget in seconds, checked between iterations
    pub timeout_secs: Option<f64>,
    /// Budget for a single engine run in seconds
    pub iteration_timeout_secs: f64,
    pub weights: DimensionWeights,
    pub min_coverage: f64,
    /// Passed through to the engine
    pub model: Option<String>,
    pub max_turns: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            quality_threshold: 70.0,
            min_improvement: 5.0,
            oscillation_window: 3,
            oscillation_threshold: 5.0,
            stagnation_threshold: 2.0,
            timeout_secs: None,
            iteration_timeout_secs: 300.0,
            weights: DimensionWeights::default(),
            min_coverage: 80.0,
            model: None,
            max_turns: None,
        }
    }
}

impl LoopConfig {
    /// Load configuration from the working directory.
    ///
    /// Returns:
    /// - `Ok(Some(config))` if file exists and parses successfully
    /// - `Ok(None)` if file does not exist
    /// - `Err(...)` if file exists but fails to parse (hard error)
    pub fn load(working_dir: &Path) -> Result<Option<Self>> {
        let config_path = working_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: LoopConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        Ok(Some(config))
    }

    /// Reject numeric settings that would make every comparison false
    pub fn validate(&self) -> Result<(), LoopError> {
        let settings = [
            ("quality_threshold", self.quality_threshold),
            ("min_improvement", self.min_improvement),
            ("oscillation_threshold", self.oscillation_threshold),
            ("stagnation_threshold", self.stagnation_threshold),
            ("min_coverage", self.min_coverage),
        ];
        match settings.iter().find(|(_, value)| !value.is_finite()) {
            Some((name, value)) => Err(LoopError::ConfigError(format!(
                "{} must be a finite number, got {}",
                name, value
            ))),
            None => Ok(()),
        }
    }

    /// Iterations the loop will actually run at most
    pub fn effective_max_iterations(&self) -> usize {
        self.max_iterations.min(HARD_MAX_ITERATIONS)
    }

    pub fn scoring_config(&self) -> ScoringConfig {
        ScoringConfig::default()
            .with_weights(self.weights.clone())
            .with_min_coverage(self.min_coverage)
            .with_quality_threshold(self.quality_threshold)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(secs_to_duration)
    }

    pub fn iteration_timeout(&self) -> Duration {
        secs_to_duration(self.iteration_timeout_secs)
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    pub fn with_min_improvement(mut self, min_improvement: f64) -> Self {
        self.min_improvement = min_improvement;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs_f64());
        self
    }

    pub fn with_iteration_timeout(mut self, timeout: Duration) -> Self {
        self.iteration_timeout_secs = timeout.as_secs_f64();
        self
    }

    pub fn with_weights(mut self, weights: DimensionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }
}

fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = LoopConfig::default();
        assert_eq!(config.max_iterations, 3);
        assert_eq!(config.quality_threshold, 70.0);
        assert_eq!(config.min_improvement, 5.0);
        assert_eq!(config.oscillation_window, 3);
        assert_eq!(config.stagnation_threshold, 2.0);
        assert!(config.timeout().is_none());
        assert_eq!(config.iteration_timeout(), Duration::from_secs(300));
        assert_eq!(config.scoring_config(), ScoringConfig::default());
    }

    #[test]
    fn test_hard_ceiling_wins() {
        let config = LoopConfig::default().with_max_iterations(10);
        assert_eq!(config.effective_max_iterations(), HARD_MAX_ITERATIONS);

        let config = LoopConfig::default().with_max_iterations(2);
        assert_eq!(config.effective_max_iterations(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(LoopConfig::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
max_iterations = 4
quality_threshold = 85.0
timeout_secs = 600.0
model = "opus"

[weights]
tests_pass = 0.35
"#,
        )
        .unwrap();

        let config = LoopConfig::load(dir.path()).unwrap().unwrap();
        assert_eq!(config.max_iterations, 4);
        assert_eq!(config.timeout(), Some(Duration::from_secs(600)));
        assert_eq!(config.model.as_deref(), Some("opus"));
        assert_eq!(config.min_improvement, 5.0);

        let scoring = config.scoring_config();
        assert_eq!(scoring.quality_threshold, 85.0);
        assert_eq!(scoring.weights.tests_pass, 0.35);
        assert_eq!(scoring.weights.code_changes, 0.30);
    }

    #[test]
    fn test_load_rejects_unknown_fields() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "hard_max_iterations = 50\n").unwrap();

        let err = LoopConfig::load(dir.path()).unwrap_err();
        assert!(format!("{:#}", err).contains(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_validate_rejects_non_finite_thresholds() {
        assert!(LoopConfig::default().validate().is_ok());
        assert!(LoopConfig::default().with_max_iterations(0).validate().is_ok());

        let err = LoopConfig::default()
            .with_quality_threshold(f64::NAN)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("quality_threshold"));

        let config = LoopConfig {
            stagnation_threshold: f64::INFINITY,
            ..LoopConfig::default()
        };
        assert!(matches!(config.validate(), Err(LoopError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_durations_clamp() {
        assert_eq!(secs_to_duration(-1.0), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(secs_to_duration(f64::INFINITY), Duration::MAX);
        assert_eq!(secs_to_duration(1.5), Duration::from_millis(1500));
    }
}
