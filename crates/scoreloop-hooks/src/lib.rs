//! # scoreloop-hooks
//!
//! The hook protocol between an execution engine and the supervisor.
//!
//! Engines emit [`HookEvent`]s; a [`HookSet`] routes each one to the
//! registered callbacks. Before-tool-use hooks may veto a call with
//! [`HookDirective::Deny`]; every other verdict is advisory.
//!
//! Stock hook sets:
//!
//! - [`create_safety_hooks`] - destructive command and sensitive path vetoes
//! - [`create_evidence_hooks`] - writes tool activity into an evidence ledger
//! - [`create_logging_hooks`] - traces tool calls
//!
//! [`create_supervisor_hooks`] merges safety and evidence hooks, which is
//! what the loop runner installs by default.

mod collectors;
mod event;
pub mod safety;
mod set;

pub use collectors::{create_evidence_hooks, create_logging_hooks, edit_line_count, write_line_count};
pub use event::{
    EventMappingError, HookContext, HookDirective, HookEvent, HookEventKind, RawHookEvent,
    ToolCall, ToolInput, ToolName, ToolResponse,
};
pub use safety::create_safety_hooks;
pub use set::{HookCallback, HookRegistration, HookSet, ToolMatcher};

use scoreloop_evidence::SharedLedger;

/// Safety hooks followed by evidence hooks for the given ledger
pub fn create_supervisor_hooks(ledger: SharedLedger) -> HookSet {
    HookSet::merge_all([create_safety_hooks(), create_evidence_hooks(ledger)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoreloop_evidence::EvidenceLedger;

    #[test]
    fn test_supervisor_hooks_deny_and_record() {
        let ledger = EvidenceLedger::new().shared();
        let hooks = create_supervisor_hooks(ledger.clone());
        let ctx = HookContext::default();

        let denied = hooks.dispatch(
            &HookEvent::BeforeToolUse {
                call: ToolCall::write("/etc/hosts", "127.0.0.1 x"),
            },
            None,
            &ctx,
        );
        assert!(denied.is_deny());

        hooks.dispatch(
            &HookEvent::AfterToolUse {
                call: ToolCall::write("src/lib.rs", "pub fn f() {}"),
                response: ToolResponse::default(),
            },
            None,
            &ctx,
        );
        assert_eq!(EvidenceLedger::lock(&ledger).evidence().total_files_modified(), 1);
    }

    #[test]
    fn test_supervisor_hooks_cover_every_kind() {
        let hooks = create_supervisor_hooks(EvidenceLedger::new().shared());
        for kind in [
            HookEventKind::BeforeToolUse,
            HookEventKind::AfterToolUse,
            HookEventKind::IterationStop,
            HookEventKind::SubTaskStop,
        ] {
            assert!(!hooks.registrations(kind).is_empty(), "{}", kind);
        }
    }
}
