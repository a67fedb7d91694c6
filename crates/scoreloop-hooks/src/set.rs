use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use crate::event::{HookContext, HookDirective, HookEvent, HookEventKind, ToolName};

/// Synchronous hook callback. Receives the event, the engine's correlation id
/// for the tool call (if any) and the per-call context.
pub type HookCallback =
    Arc<dyn Fn(&HookEvent, Option<&str>, &HookContext) -> HookDirective + Send + Sync>;

/// Which tool calls a registration applies to
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ToolMatcher {
    /// Every event of the registered kind
    #[default]
    Any,
    /// Only tool events whose tool is in the list
    Tools(Vec<ToolName>),
}

impl ToolMatcher {
    pub fn tools(names: impl IntoIterator<Item = ToolName>) -> Self {
        ToolMatcher::Tools(names.into_iter().collect())
    }

    pub fn matches(&self, event: &HookEvent) -> bool {
        match self {
            ToolMatcher::Any => true,
            ToolMatcher::Tools(names) => event
                .tool()
                .map(|call| names.contains(&call.name))
                .unwrap_or(false),
        }
    }
}

#[derive(Clone)]
pub struct HookRegistration {
    pub name: String,
    pub matcher: ToolMatcher,
    callback: HookCallback,
}

impl std::fmt::Debug for HookRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRegistration")
            .field("name", &self.name)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

impl HookRegistration {
    pub fn new<F>(name: impl Into<String>, matcher: ToolMatcher, callback: F) -> Self
    where
        F: Fn(&HookEvent, Option<&str>, &HookContext) -> HookDirective + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            matcher,
            callback: Arc::new(callback),
        }
    }

    pub fn call(
        &self,
        event: &HookEvent,
        correlation_id: Option<&str>,
        ctx: &HookContext,
    ) -> HookDirective {
        (self.callback)(event, correlation_id, ctx)
    }
}

/// Hook registrations grouped by event kind, in registration order
#[derive(Debug, Clone, Default)]
pub struct HookSet {
    hooks: BTreeMap<HookEventKind, Vec<HookRegistration>>,
}

impl HookSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: HookEventKind, registration: HookRegistration) {
        self.hooks.entry(kind).or_default().push(registration);
    }

    /// Builder form of [`HookSet::register`]
    pub fn with<F>(
        mut self,
        kind: HookEventKind,
        name: impl Into<String>,
        matcher: ToolMatcher,
        callback: F,
    ) -> Self
    where
        F: Fn(&HookEvent, Option<&str>, &HookContext) -> HookDirective + Send + Sync + 'static,
    {
        self.register(kind, HookRegistration::new(name, matcher, callback));
        self
    }

    /// Concatenate `other`'s registrations after ours, per kind.
    /// Nothing is deduplicated.
    pub fn merge(mut self, other: HookSet) -> Self {
        for (kind, registrations) in other.hooks {
            self.hooks.entry(kind).or_default().extend(registrations);
        }
        self
    }

    pub fn merge_all(sets: impl IntoIterator<Item = HookSet>) -> Self {
        sets.into_iter().fold(HookSet::new(), HookSet::merge)
    }

    pub fn registrations(&self, kind: HookEventKind) -> &[HookRegistration] {
        self.hooks.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every matching hook for the event. The first deny wins, but later
    /// hooks still run so observers see the call.
    pub fn dispatch(
        &self,
        event: &HookEvent,
        correlation_id: Option<&str>,
        ctx: &HookContext,
    ) -> HookDirective {
        let mut verdict = HookDirective::Allow;

        for registration in self.registrations(event.kind()) {
            if !registration.matcher.matches(event) {
                continue;
            }
            let directive = registration.call(event, correlation_id, ctx);
            if let HookDirective::Deny { reason } = &directive {
                if !verdict.is_deny() {
                    warn!(hook = %registration.name, kind = %event.kind(), %reason, "Hook denied tool call");
                    verdict = directive;
                }
            }
        }

        verdict
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ToolCall;
    use std::sync::Mutex;

    fn recorder(log: Arc<Mutex<Vec<String>>>, label: &'static str) -> HookRegistration {
        HookRegistration::new(label, ToolMatcher::Any, move |_, _, _| {
            log.lock().unwrap().push(label.to_string());
            HookDirective::Allow
        })
    }

    #[test]
    fn test_merge_concatenates_in_order_without_dedup() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut first = HookSet::new();
        first.register(HookEventKind::AfterToolUse, recorder(log.clone(), "a"));
        let mut second = HookSet::new();
        second.register(HookEventKind::AfterToolUse, recorder(log.clone(), "b"));
        second.register(HookEventKind::AfterToolUse, recorder(log.clone(), "a"));

        let merged = first.merge(second);
        assert_eq!(merged.len(), 3);

        let event = HookEvent::AfterToolUse {
            call: ToolCall::read("README.md"),
            response: Default::default(),
        };
        merged.dispatch(&event, None, &HookContext::default());
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_merge_all_keeps_set_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sets = ["x", "y", "z"].map(|label| {
            let mut set = HookSet::new();
            set.register(HookEventKind::IterationStop, recorder(log.clone(), label));
            set
        });

        let merged = HookSet::merge_all(sets);
        assert_eq!(merged.registrations(HookEventKind::IterationStop).len(), 3);
        assert!(merged.registrations(HookEventKind::BeforeToolUse).is_empty());

        let event = HookEvent::IterationStop { session_id: None };
        merged.dispatch(&event, None, &HookContext::default());
        assert_eq!(*log.lock().unwrap(), vec!["x", "y", "z"]);

        assert!(HookSet::merge_all(Vec::new()).is_empty());
    }

    #[test]
    fn test_dispatch_returns_first_deny_and_runs_the_rest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut set = HookSet::new()
            .with(HookEventKind::BeforeToolUse, "first", ToolMatcher::Any, |_, _, _| {
                HookDirective::deny("first")
            })
            .with(HookEventKind::BeforeToolUse, "second", ToolMatcher::Any, |_, _, _| {
                HookDirective::deny("second")
            });
        set.register(HookEventKind::BeforeToolUse, recorder(log.clone(), "observer"));

        let event = HookEvent::BeforeToolUse {
            call: ToolCall::shell("ls"),
        };
        let verdict = set.dispatch(&event, Some("toolu_1"), &HookContext::default());

        assert_eq!(verdict, HookDirective::deny("first"));
        assert_eq!(*log.lock().unwrap(), vec!["observer"]);
    }

    #[test]
    fn test_tool_matcher_filters_by_tool() {
        let set = HookSet::new().with(
            HookEventKind::BeforeToolUse,
            "bash-only",
            ToolMatcher::tools([ToolName::Bash]),
            |_, _, _| HookDirective::deny("no"),
        );
        let ctx = HookContext::default();

        let read = HookEvent::BeforeToolUse {
            call: ToolCall::read("a.rs"),
        };
        assert_eq!(set.dispatch(&read, None, &ctx), HookDirective::Allow);

        let bash = HookEvent::BeforeToolUse {
            call: ToolCall::shell("ls"),
        };
        assert!(set.dispatch(&bash, None, &ctx).is_deny());
    }

    #[test]
    fn test_dispatch_only_runs_hooks_for_event_kind() {
        let set = HookSet::new().with(
            HookEventKind::BeforeToolUse,
            "deny-all",
            ToolMatcher::Any,
            |_, _, _| HookDirective::deny("no"),
        );
        let stop = HookEvent::IterationStop { session_id: None };
        assert_eq!(
            set.dispatch(&stop, None, &HookContext::default()),
            HookDirective::Allow
        );
    }
}
