use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::interpreter::{HeuristicInterpreter, TestOutputInterpreter};
use crate::{
    CommandResult, Evidence, FileAction, FileChange, SubtaskRecord, TestResult, ToolInvocation,
};

/// Longest tool output kept in the debug trail
const MAX_INVOCATION_OUTPUT: usize = 1000;

/// Ledger shared between the loop controller and hook callbacks.
///
/// Only one iteration writes to it at a time; the controller resets it
/// before each engine call and snapshots it afterwards.
pub type SharedLedger = Arc<Mutex<EvidenceLedger>>;

/// Mutable evidence record for the current iteration
pub struct EvidenceLedger {
    evidence: Evidence,
    interpreter: Arc<dyn TestOutputInterpreter>,
}

impl Default for EvidenceLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EvidenceLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceLedger")
            .field("evidence", &self.evidence)
            .finish_non_exhaustive()
    }
}

impl EvidenceLedger {
    /// New ledger with a fresh session id and the heuristic interpreter
    pub fn new() -> Self {
        Self::with_interpreter(Arc::new(HeuristicInterpreter))
    }

    pub fn with_interpreter(interpreter: Arc<dyn TestOutputInterpreter>) -> Self {
        Self {
            evidence: Evidence::new(uuid::Uuid::new_v4().to_string()),
            interpreter,
        }
    }

    /// Wrap in the shared handle handed to hooks
    pub fn shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    /// Lock a shared ledger. A poisoned lock still holds append-only data,
    /// so the guard is recovered rather than propagated.
    pub fn lock(ledger: &SharedLedger) -> MutexGuard<'_, EvidenceLedger> {
        ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }

    /// Owned copy for assessment
    pub fn snapshot(&self) -> Evidence {
        self.evidence.clone()
    }

    pub fn session_id(&self) -> &str {
        &self.evidence.session_id
    }

    /// Clear per-iteration state. Calling it twice is the same as once.
    pub fn reset(&mut self) {
        self.evidence.clear_iteration();
    }

    pub fn record_file_write(&mut self, path: &str, lines_changed: usize) {
        trace!(path, lines_changed, "file write");
        self.evidence.files_written.push(path.to_string());
        self.evidence
            .file_changes
            .push(FileChange::new(path, FileAction::Write, lines_changed));
    }

    pub fn record_file_edit(&mut self, path: &str, lines_changed: usize) {
        trace!(path, lines_changed, "file edit");
        self.evidence.files_edited.push(path.to_string());
        self.evidence
            .file_changes
            .push(FileChange::new(path, FileAction::Edit, lines_changed));
    }

    pub fn record_file_read(&mut self, path: &str) {
        trace!(path, "file read");
        self.evidence.files_read.push(path.to_string());
        self.evidence
            .file_changes
            .push(FileChange::new(path, FileAction::Read, 0));
    }

    /// Record a shell command and parse its output for test results
    pub fn record_command(&mut self, command: &str, output: &str, exit_code: i32, duration_ms: u64) {
        self.evidence.commands_run.push(CommandResult {
            command: command.to_string(),
            output: output.to_string(),
            exit_code,
            timestamp: Utc::now(),
            duration_ms,
        });

        if let Some(result) = self.interpreter.interpret(command, output) {
            debug!(
                framework = %result.framework,
                passed = result.passed,
                failed = result.failed,
                "Parsed test run"
            );
            self.record_test_result(result);
        }
    }

    /// Record results from a structured source (JUnit report, runner API)
    pub fn record_test_result(&mut self, result: TestResult) {
        self.evidence.tests_run = true;
        self.evidence.test_results.push(result);
    }

    pub fn record_subtask_stop(&mut self, correlation_id: Option<&str>, stop_hook_active: bool) {
        self.evidence.subtasks_spawned += 1;
        self.evidence.subtask_results.push(SubtaskRecord {
            correlation_id: correlation_id.map(String::from),
            stop_hook_active,
            timestamp: Utc::now(),
        });
    }

    pub fn record_tool_invocation(
        &mut self,
        tool_name: &str,
        tool_input: serde_json::Value,
        tool_output: &str,
    ) {
        let tool_output = truncate_chars(tool_output, MAX_INVOCATION_OUTPUT);
        self.evidence.tool_invocations.push(ToolInvocation {
            tool_name: tool_name.to_string(),
            tool_input,
            tool_output,
            timestamp: Utc::now(),
        });
    }

    /// Mark the end of the engine run; an engine-provided session id wins
    pub fn finish_session(&mut self, session_id: Option<&str>) {
        self.evidence.end_time = Some(Utc::now());
        if let Some(id) = session_id.filter(|id| !id.is_empty()) {
            self.evidence.session_id = id.to_string();
        }
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TestFramework;

    #[test]
    fn test_reset_preserves_session_and_clears_iteration() {
        let mut ledger = EvidenceLedger::new();
        let session = ledger.session_id().to_string();
        let started = ledger.evidence().start_time;

        ledger.record_file_write("src/lib.rs", 10);
        ledger.record_command("cargo test", "test result: ok. 1 passed; 0 failed; 0 ignored", 0, 5);
        ledger.record_subtask_stop(Some("t1"), false);

        ledger.reset();
        let evidence = ledger.evidence();
        assert!(evidence.files_written.is_empty());
        assert!(evidence.file_changes.is_empty());
        assert!(evidence.commands_run.is_empty());
        assert!(!evidence.tests_run);
        assert!(evidence.test_results.is_empty());
        assert_eq!(evidence.subtasks_spawned, 0);
        assert_eq!(evidence.session_id, session);
        assert_eq!(evidence.start_time, started);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut ledger = EvidenceLedger::new();
        ledger.record_file_edit("a.rs", 2);

        ledger.reset();
        let once = serde_json::to_value(ledger.snapshot()).unwrap();
        ledger.reset();
        let twice = serde_json::to_value(ledger.snapshot()).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_record_command_sets_tests_run_on_recognised_output() {
        let mut ledger = EvidenceLedger::new();
        ledger.record_command("ls", "Cargo.toml", 0, 1);
        assert!(!ledger.evidence().tests_run);

        ledger.record_command(
            "cargo test",
            "test result: ok. 7 passed; 0 failed; 0 ignored; 0 measured",
            0,
            1200,
        );
        let evidence = ledger.evidence();
        assert!(evidence.tests_run);
        assert_eq!(evidence.commands_run.len(), 2);
        assert_eq!(evidence.test_results[0].framework, TestFramework::Cargo);
        assert_eq!(evidence.total_tests_passed(), 7);
    }

    #[test]
    fn test_reads_never_count_as_modifications() {
        let mut ledger = EvidenceLedger::new();
        ledger.record_file_read("README.md");
        ledger.record_file_read("src/main.rs");
        assert_eq!(ledger.evidence().total_files_modified(), 0);
        assert_eq!(ledger.evidence().file_changes.len(), 2);
    }

    #[test]
    fn test_interleaved_records_keep_counts_consistent() {
        let mut ledger = EvidenceLedger::new();
        ledger.record_file_edit("b.rs", 1);
        ledger.record_file_read("b.rs");
        ledger.record_file_write("a.rs", 3);
        ledger.record_file_edit("a.rs", 1);
        ledger.record_file_write("c.rs", 0);

        let evidence = ledger.evidence();
        assert_eq!(evidence.total_files_modified(), 3);
        assert_eq!(evidence.file_changes.len(), 5);
        assert_eq!(evidence.file_changes[1].action, FileAction::Read);
    }

    #[test]
    fn test_custom_interpreter_replaces_heuristics() {
        struct AlwaysPasses;
        impl TestOutputInterpreter for AlwaysPasses {
            fn interpret(&self, _command: &str, _output: &str) -> Option<TestResult> {
                Some(TestResult::new(TestFramework::External).with_counts(1, 0))
            }
        }

        let mut ledger = EvidenceLedger::with_interpreter(Arc::new(AlwaysPasses));
        ledger.record_command("make check", "", 0, 0);
        assert!(ledger.evidence().all_tests_passing());
    }

    #[test]
    fn test_finish_session_keeps_existing_id_when_engine_sends_none() {
        let mut ledger = EvidenceLedger::new();
        let original = ledger.session_id().to_string();

        ledger.finish_session(Some(""));
        assert_eq!(ledger.session_id(), original);
        assert!(ledger.evidence().end_time.is_some());

        ledger.finish_session(Some("engine-session"));
        assert_eq!(ledger.session_id(), "engine-session");
    }

    #[test]
    fn test_tool_invocation_output_is_truncated() {
        let mut ledger = EvidenceLedger::new();
        let long = "é".repeat(MAX_INVOCATION_OUTPUT + 50);
        ledger.record_tool_invocation("Bash", serde_json::json!({"command": "x"}), &long);
        let kept = &ledger.evidence().tool_invocations[0].tool_output;
        assert_eq!(kept.chars().count(), MAX_INVOCATION_OUTPUT);
    }
}
