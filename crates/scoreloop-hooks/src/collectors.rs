use scoreloop_evidence::{EvidenceLedger, SharedLedger};
use tracing::{debug, info, trace};

use crate::event::{HookDirective, HookEvent, HookEventKind, ToolInput};
use crate::set::{HookSet, ToolMatcher};

/// Lines touched by a full-file write
pub fn write_line_count(content: &str) -> usize {
    if content.is_empty() {
        0
    } else {
        content.matches('\n').count() + 1
    }
}

/// Rough size of an edit: the change in newline count, plus the edited line
pub fn edit_line_count(old_string: &str, new_string: &str) -> usize {
    let old = old_string.matches('\n').count();
    let new = new_string.matches('\n').count();
    old.abs_diff(new) + 1
}

fn record_tool_result(ledger: &SharedLedger, event: &HookEvent) {
    let HookEvent::AfterToolUse { call, response } = event else {
        return;
    };

    let mut ledger = EvidenceLedger::lock(ledger);
    match &call.input {
        ToolInput::WriteFile { path, content } => {
            ledger.record_file_write(path, write_line_count(content));
        }
        ToolInput::EditFile {
            path,
            old_string,
            new_string,
        } => {
            ledger.record_file_edit(path, edit_line_count(old_string, new_string));
        }
        ToolInput::ReadFile { path } => ledger.record_file_read(path),
        ToolInput::Shell { command } => {
            ledger.record_command(
                command,
                &response.output,
                response.exit_code,
                response.duration_ms,
            );
        }
        ToolInput::Other => {}
    }
    ledger.record_tool_invocation(call.name.as_str(), call.raw_input.clone(), &response.output);
}

/// Hooks that turn tool activity into ledger entries
pub fn create_evidence_hooks(ledger: SharedLedger) -> HookSet {
    let after = ledger.clone();
    let stop = ledger.clone();
    let subtask = ledger;

    HookSet::new()
        .with(
            HookEventKind::AfterToolUse,
            "evidence",
            ToolMatcher::Any,
            move |event, _, _| {
                record_tool_result(&after, event);
                HookDirective::Allow
            },
        )
        .with(
            HookEventKind::IterationStop,
            "evidence",
            ToolMatcher::Any,
            move |event, _, ctx| {
                if let HookEvent::IterationStop { session_id } = event {
                    let mut ledger = EvidenceLedger::lock(&stop);
                    ledger.finish_session(session_id.as_deref());
                    let evidence = ledger.evidence();
                    info!(
                        iteration = ctx.iteration,
                        files_modified = evidence.total_files_modified(),
                        tests_run = evidence.tests_run,
                        "Engine run finished"
                    );
                }
                HookDirective::Allow
            },
        )
        .with(
            HookEventKind::SubTaskStop,
            "evidence",
            ToolMatcher::Any,
            move |event, correlation_id, _| {
                if let HookEvent::SubTaskStop { stop_hook_active } = event {
                    debug!(?correlation_id, "Sub-task finished");
                    EvidenceLedger::lock(&subtask)
                        .record_subtask_stop(correlation_id, *stop_hook_active);
                }
                HookDirective::Allow
            },
        )
}

/// Hooks that trace every tool call without touching any state
pub fn create_logging_hooks() -> HookSet {
    HookSet::new()
        .with(
            HookEventKind::BeforeToolUse,
            "logging",
            ToolMatcher::Any,
            |event, correlation_id, ctx| {
                if let Some(call) = event.tool() {
                    debug!(
                        iteration = ctx.iteration,
                        tool = %call.name,
                        ?correlation_id,
                        "Tool call starting"
                    );
                }
                HookDirective::Allow
            },
        )
        .with(
            HookEventKind::AfterToolUse,
            "logging",
            ToolMatcher::Any,
            |event, correlation_id, ctx| {
                if let HookEvent::AfterToolUse { call, response } = event {
                    trace!(
                        iteration = ctx.iteration,
                        tool = %call.name,
                        ?correlation_id,
                        exit_code = response.exit_code,
                        output_len = response.output.len(),
                        "Tool call finished"
                    );
                }
                HookDirective::Allow
            },
        )
}
