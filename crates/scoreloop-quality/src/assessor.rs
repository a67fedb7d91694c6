use scoreloop_evidence::Evidence;
use std::collections::BTreeMap;
use tracing::debug;

use crate::{Assessment, AssessmentComparison, Dimension, QualityBand, ScoringConfig};

/// Lower-cased markers that flag a command's output as containing errors
pub const ERROR_MARKERS: &[&str] = &["error:", "exception:", "traceback", "failed:"];

pub const CRITICAL_MAJORITY_FAILING: &str = "CRITICAL: Majority of tests failing";

/// Highest score allowed when most tests fail
const MAJORITY_FAILING_CAP: f64 = 40.0;

const MAX_IMPROVEMENTS: usize = 5;

/// Neutral credit for dimensions with nothing to measure
const NEUTRAL: f64 = 50.0;

/// Score an evidence snapshot
pub fn assess(evidence: &Evidence, config: &ScoringConfig) -> Assessment {
    let mut dimension_scores = BTreeMap::new();
    let mut raw = 0.0_f64;
    let mut ranked: Vec<(f64, String)> = Vec::new();

    for dimension in Dimension::ALL {
        let value = score_dimension(dimension, evidence, config);
        let weight = config.weights.weight(dimension);
        raw += value * weight;
        dimension_scores.insert(dimension, value);

        if value < 100.0 {
            if let Some(message) = improvement_for(dimension, value, evidence, config) {
                ranked.push((weight * (100.0 - value), message));
            }
        }
    }

    // Stable sort keeps dimension order for equal losses
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
    let mut improvements: Vec<String> = ranked.into_iter().map(|(_, msg)| msg).collect();

    let majority_failing =
        evidence.tests_run && evidence.total_tests_failed() > evidence.total_tests_passed();
    if majority_failing {
        raw = raw.min(MAJORITY_FAILING_CAP);
        improvements.insert(0, CRITICAL_MAJORITY_FAILING.to_string());
    }
    improvements.truncate(MAX_IMPROVEMENTS);

    let score = round1(raw.clamp(0.0, 100.0));
    debug!(score, majority_failing, "Assessed evidence");

    Assessment {
        score,
        passed: score >= config.quality_threshold,
        band: QualityBand::from_score(score),
        improvements_needed: improvements,
        dimension_scores,
    }
}

/// Progress from `previous` to `current`
pub fn compare(current: &Assessment, previous: &Assessment) -> AssessmentComparison {
    let delta = current.score - previous.score;
    AssessmentComparison {
        score_delta: round1(delta),
        improved: delta > 0.0,
        regressed: delta < 0.0,
        stagnant: delta.abs() < 2.0,
        current_band: current.band,
        previous_band: previous.band,
        band_changed: current.band != previous.band,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn score_dimension(dimension: Dimension, evidence: &Evidence, config: &ScoringConfig) -> f64 {
    match dimension {
        Dimension::CodeChanges => match evidence.total_files_modified() {
            0 => 0.0,
            1 | 2 => 80.0,
            _ => 100.0,
        },
        Dimension::TestsRun => {
            if evidence.tests_run {
                100.0
            } else {
                0.0
            }
        }
        Dimension::TestsPass => {
            if !evidence.tests_run {
                return NEUTRAL;
            }
            let passed = evidence.total_tests_passed() as f64;
            let total = passed + evidence.total_tests_failed() as f64;
            if total == 0.0 {
                NEUTRAL
            } else {
                100.0 * passed / total
            }
        }
        Dimension::Coverage => {
            if !evidence.tests_run {
                return NEUTRAL;
            }
            match evidence.average_coverage() {
                None => NEUTRAL,
                Some(avg) if avg >= config.min_coverage => 100.0,
                Some(avg) => 100.0 * avg / config.min_coverage,
            }
        }
        Dimension::NoErrors => {
            if evidence.total_test_errors() > 0 {
                0.0
            } else if evidence.commands_run.iter().any(|c| has_error_marker(&c.output)) {
                NEUTRAL
            } else {
                100.0
            }
        }
    }
}

fn has_error_marker(output: &str) -> bool {
    let lowered = output.to_lowercase();
    ERROR_MARKERS.iter().any(|marker| lowered.contains(marker))
}

fn improvement_for(
    dimension: Dimension,
    value: f64,
    evidence: &Evidence,
    config: &ScoringConfig,
) -> Option<String> {
    match dimension {
        Dimension::CodeChanges if value == 0.0 => {
            Some("No code changes detected - verify implementation".to_string())
        }
        Dimension::CodeChanges => Some(format!(
            "Only {} file(s) modified - confirm all required changes are made",
            evidence.total_files_modified()
        )),
        Dimension::TestsRun => Some("Run tests to verify changes work correctly".to_string()),
        // Untested runs are already covered by the tests_run suggestion
        Dimension::TestsPass | Dimension::Coverage if !evidence.tests_run => None,
        Dimension::TestsPass => {
            let failed = evidence.total_tests_failed();
            if failed > 0 {
                Some(format!("Fix {} failing test(s)", failed))
            } else {
                Some("Test run reported no results - check the test command".to_string())
            }
        }
        Dimension::Coverage => match evidence.average_coverage() {
            Some(avg) => Some(format!(
                "Increase test coverage from {:.1}% to {:.1}%",
                avg, config.min_coverage
            )),
            None => Some("Enable coverage reporting for the test run".to_string()),
        },
        Dimension::NoErrors => Some("Fix errors in test or command output".to_string()),
    }
}
