use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of file access observed through a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileAction {
    Write,
    Edit,
    Read,
}

impl std::fmt::Display for FileAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileAction::Write => write!(f, "write"),
            FileAction::Edit => write!(f, "edit"),
            FileAction::Read => write!(f, "read"),
        }
    }
}

/// Record of a single file access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub action: FileAction,
    pub timestamp: DateTime<Utc>,
    pub lines_changed: usize,
}

impl FileChange {
    pub fn new(path: impl Into<String>, action: FileAction, lines_changed: usize) -> Self {
        Self {
            path: path.into(),
            action,
            timestamp: Utc::now(),
            lines_changed,
        }
    }
}

/// Record of a shell command executed by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub command: String,
    pub output: String,
    pub exit_code: i32,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Test runner dialect recognised in command output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestFramework {
    Pytest,
    Jest,
    Cargo,
    Go,
    /// Results supplied by a structured source rather than parsed text
    External,
}

impl std::fmt::Display for TestFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestFramework::Pytest => write!(f, "pytest"),
            TestFramework::Jest => write!(f, "jest"),
            TestFramework::Cargo => write!(f, "cargo"),
            TestFramework::Go => write!(f, "go"),
            TestFramework::External => write!(f, "external"),
        }
    }
}

/// Counts extracted from one test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub framework: TestFramework,
    pub passed: u32,
    pub failed: u32,
    pub skipped: u32,
    pub errors: u32,
    /// Reported line coverage, when the runner printed one
    pub coverage_percent: Option<f64>,
}

impl TestResult {
    pub fn new(framework: TestFramework) -> Self {
        Self {
            framework,
            passed: 0,
            failed: 0,
            skipped: 0,
            errors: 0,
            coverage_percent: None,
        }
    }

    pub fn with_counts(mut self, passed: u32, failed: u32) -> Self {
        self.passed = passed;
        self.failed = failed;
        self
    }

    pub fn with_errors(mut self, errors: u32) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_coverage(mut self, coverage: f64) -> Self {
        self.coverage_percent = Some(coverage);
        self
    }

    pub fn total(&self) -> u64 {
        u64::from(self.passed) + u64::from(self.failed)
    }
}

/// Completion of a sub-task spawned by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskRecord {
    pub correlation_id: Option<String>,
    pub stop_hook_active: bool,
    pub timestamp: DateTime<Utc>,
}

/// Raw tool call kept for debugging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub tool_input: serde_json::Value,
    pub tool_output: String,
    pub timestamp: DateTime<Utc>,
}
