//! Heuristic classification of test-runner output.
//!
//! Commands run by the agent arrive as plain text. The interpreter decides
//! whether a `(command, output)` pair came from a known test runner and, if
//! so, extracts pass/fail/skip/error counts and any coverage figure.
//!
//! Dialects are checked in a fixed order. `cargo` must be checked before
//! `go` because the string `"cargo test"` contains `"go test"`.

use lazy_static::lazy_static;
use regex::Regex;
use std::num::IntErrorKind;
use tracing::debug;

use crate::{TestFramework, TestResult};

/// Turns a command and its captured output into a test result
pub trait TestOutputInterpreter: Send + Sync {
    /// Returns `None` when the pair is not recognised as a test run
    fn interpret(&self, command: &str, output: &str) -> Option<TestResult>;
}

/// Default interpreter covering pytest, jest, cargo and go
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicInterpreter;

lazy_static! {
    static ref PASSED: Regex = Regex::new(r"(\d+)\s+passed").unwrap();
    static ref FAILED: Regex = Regex::new(r"(\d+)\s+failed").unwrap();
    static ref SKIPPED: Regex = Regex::new(r"(\d+)\s+skipped").unwrap();
    static ref ERRORS: Regex = Regex::new(r"(\d+)\s+errors?\b").unwrap();
    static ref PYTEST_BANNER: Regex = Regex::new(r"=+ test session starts =+").unwrap();
    static ref JEST_TESTS_LINE: Regex = Regex::new(r"(?m)^\s*Tests:\s+(.*\d+ total.*)$").unwrap();
    static ref JEST_ALL_FILES: Regex =
        Regex::new(r"(?m)^\s*All files\s*\|\s*(\d+(?:\.\d+)?)").unwrap();
    static ref CARGO_RESULT: Regex =
        Regex::new(r"test result: \w+\. (\d+) passed; (\d+) failed; (\d+) ignored").unwrap();
    static ref GO_TEST_PASS: Regex = Regex::new(r"(?m)^\s*--- PASS:").unwrap();
    static ref GO_TEST_FAIL: Regex = Regex::new(r"(?m)^\s*--- FAIL:").unwrap();
    static ref GO_TEST_SKIP: Regex = Regex::new(r"(?m)^\s*--- SKIP:").unwrap();
    static ref GO_PKG_OK: Regex = Regex::new(r"(?m)^ok\s+").unwrap();
    static ref GO_PKG_FAIL: Regex = Regex::new(r"(?m)^FAIL\s+").unwrap();
    static ref COVERAGE_TOTAL: Regex =
        Regex::new(r"(?m)^TOTAL\s.*?(\d+(?:\.\d+)?)%\s*$").unwrap();
    static ref COVERAGE_PHRASE: Regex =
        Regex::new(r"(?i)coverage:?\s+(\d+(?:\.\d+)?)%").unwrap();
}

impl TestOutputInterpreter for HeuristicInterpreter {
    fn interpret(&self, command: &str, output: &str) -> Option<TestResult> {
        let framework = Self::detect(command, output)?;
        debug!(%framework, command, "Recognised test run");

        let result = match framework {
            TestFramework::Pytest => parse_pytest(output),
            TestFramework::Jest => parse_jest(output),
            TestFramework::Cargo => parse_cargo(output),
            TestFramework::Go => parse_go(output),
            TestFramework::External => return None,
        };
        Some(result)
    }
}

impl HeuristicInterpreter {
    pub fn new() -> Self {
        Self
    }

    /// Identify the runner dialect. Order matters, see module docs.
    pub fn detect(command: &str, output: &str) -> Option<TestFramework> {
        if command.contains("pytest")
            || command.contains("py.test")
            || PYTEST_BANNER.is_match(output)
        {
            return Some(TestFramework::Pytest);
        }

        if command.contains("jest")
            || command.contains("npm test")
            || command.contains("npm run test")
            || command.contains("yarn test")
            || command.contains("pnpm test")
            || JEST_TESTS_LINE.is_match(output)
        {
            return Some(TestFramework::Jest);
        }

        if command.contains("cargo test") {
            return Some(TestFramework::Cargo);
        }

        if command.contains("go test") {
            return Some(TestFramework::Go);
        }

        None
    }
}

fn parse_pytest(output: &str) -> TestResult {
    let mut result = TestResult::new(TestFramework::Pytest);

    // The short summary is the last line carrying counts
    result.passed = last_count(&PASSED, output);
    result.failed = last_count(&FAILED, output);
    result.skipped = last_count(&SKIPPED, output);
    result.errors = last_count(&ERRORS, output);
    result.coverage_percent = extract_coverage(output);

    result
}

fn parse_jest(output: &str) -> TestResult {
    let mut result = TestResult::new(TestFramework::Jest);

    // "Tests:       1 failed, 5 passed, 6 total"; the "Test Suites:" line
    // uses the same words so prefer the dedicated line when it exists.
    let summary = JEST_TESTS_LINE
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(output);

    result.passed = last_count(&PASSED, summary);
    result.failed = last_count(&FAILED, summary);
    result.skipped = last_count(&SKIPPED, summary);
    result.coverage_percent = JEST_ALL_FILES
        .captures(output)
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .or_else(|| extract_coverage(output));

    result
}

fn parse_cargo(output: &str) -> TestResult {
    let mut result = TestResult::new(TestFramework::Cargo);

    // One "test result:" line per test binary
    for caps in CARGO_RESULT.captures_iter(output) {
        result.passed = result.passed.saturating_add(parse_count(&caps[1]));
        result.failed = result.failed.saturating_add(parse_count(&caps[2]));
        result.skipped = result.skipped.saturating_add(parse_count(&caps[3]));
    }

    if output.contains("could not compile") {
        result.errors = 1;
    }
    result.coverage_percent = extract_coverage(output);

    result
}

fn parse_go(output: &str) -> TestResult {
    let mut result = TestResult::new(TestFramework::Go);

    let per_test_pass = count_matches(&GO_TEST_PASS, output);
    let per_test_fail = count_matches(&GO_TEST_FAIL, output);

    if per_test_pass > 0 || per_test_fail > 0 {
        result.passed = per_test_pass;
        result.failed = per_test_fail;
        result.skipped = count_matches(&GO_TEST_SKIP, output);
    } else {
        // Without -v only package-level lines are printed
        result.passed = count_matches(&GO_PKG_OK, output);
        result.failed = count_matches(&GO_PKG_FAIL, output);
    }
    result.coverage_percent = extract_coverage(output);

    result
}

fn last_count(pattern: &Regex, text: &str) -> u32 {
    pattern
        .captures_iter(text)
        .last()
        .map(|caps| parse_count(&caps[1]))
        .unwrap_or(0)
}

/// Digits that do not fit a `u32` saturate rather than read as zero
fn parse_count(digits: &str) -> u32 {
    match digits.parse::<u32>() {
        Ok(n) => n,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => u32::MAX,
        Err(_) => 0,
    }
}

fn count_matches(pattern: &Regex, text: &str) -> u32 {
    u32::try_from(pattern.find_iter(text).count()).unwrap_or(u32::MAX)
}

/// Coverage from a pytest-cov `TOTAL` row, else the mean of every
/// `coverage: NN%` phrase (go prints one per package).
fn extract_coverage(output: &str) -> Option<f64> {
    if let Some(total) = COVERAGE_TOTAL
        .captures(output)
        .and_then(|caps| caps[1].parse::<f64>().ok())
    {
        return Some(total);
    }

    let figures: Vec<f64> = COVERAGE_PHRASE
        .captures_iter(output)
        .filter_map(|caps| caps[1].parse::<f64>().ok())
        .collect();

    if figures.is_empty() {
        None
    } else {
        Some(figures.iter().sum::<f64>() / figures.len() as f64)
    }
}
