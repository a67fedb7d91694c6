use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Tools the supervisor understands; everything else is carried by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolName {
    Bash,
    Write,
    Edit,
    Read,
    Task,
    Other(String),
}

impl ToolName {
    pub fn parse(name: &str) -> Self {
        match name {
            "Bash" => ToolName::Bash,
            "Write" => ToolName::Write,
            "Edit" | "MultiEdit" => ToolName::Edit,
            "Read" => ToolName::Read,
            "Task" => ToolName::Task,
            other => ToolName::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ToolName::Bash => "Bash",
            ToolName::Write => "Write",
            ToolName::Edit => "Edit",
            ToolName::Read => "Read",
            ToolName::Task => "Task",
            ToolName::Other(name) => name,
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool input reduced to the fields the supervisor reads
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    Shell {
        command: String,
    },
    WriteFile {
        path: String,
        content: String,
    },
    EditFile {
        path: String,
        old_string: String,
        new_string: String,
    },
    ReadFile {
        path: String,
    },
    Other,
}

/// A single tool invocation as seen by hooks
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: ToolName,
    pub input: ToolInput,
    /// Untouched engine payload, kept for the debug trail
    pub raw_input: Value,
}

impl ToolCall {
    /// Map an engine tool name and JSON input into a typed call
    pub fn from_raw(name: &str, input: &Value) -> Self {
        let name = ToolName::parse(name);
        let field = |key: &str| {
            input
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let typed = match name {
            ToolName::Bash => ToolInput::Shell {
                command: field("command"),
            },
            ToolName::Write => ToolInput::WriteFile {
                path: field("file_path"),
                content: field("content"),
            },
            ToolName::Edit => ToolInput::EditFile {
                path: field("file_path"),
                old_string: field("old_string"),
                new_string: field("new_string"),
            },
            ToolName::Read => ToolInput::ReadFile {
                path: field("file_path"),
            },
            ToolName::Task | ToolName::Other(_) => ToolInput::Other,
        };

        Self {
            name,
            input: typed,
            raw_input: input.clone(),
        }
    }

    pub fn shell(command: &str) -> Self {
        Self::from_raw("Bash", &serde_json::json!({ "command": command }))
    }

    pub fn write(path: &str, content: &str) -> Self {
        Self::from_raw(
            "Write",
            &serde_json::json!({ "file_path": path, "content": content }),
        )
    }

    pub fn edit(path: &str, old_string: &str, new_string: &str) -> Self {
        Self::from_raw(
            "Edit",
            &serde_json::json!({
                "file_path": path,
                "old_string": old_string,
                "new_string": new_string,
            }),
        )
    }

    pub fn read(path: &str) -> Self {
        Self::from_raw("Read", &serde_json::json!({ "file_path": path }))
    }

    /// Target path for file tools
    pub fn file_path(&self) -> Option<&str> {
        match &self.input {
            ToolInput::WriteFile { path, .. }
            | ToolInput::EditFile { path, .. }
            | ToolInput::ReadFile { path } => Some(path),
            _ => None,
        }
    }

    /// Command string for shell tools
    pub fn command(&self) -> Option<&str> {
        match &self.input {
            ToolInput::Shell { command } => Some(command),
            _ => None,
        }
    }
}

/// What a tool returned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolResponse {
    pub output: String,
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl ToolResponse {
    pub fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            ..Default::default()
        }
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    /// Accepts either a bare string or an object with stdout/stderr/exit code
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::default(),
            Value::String(s) => Self::text(s.clone()),
            Value::Object(map) => {
                let text = |key: &str| map.get(key).and_then(Value::as_str).unwrap_or_default();
                let stdout = text("stdout");
                let stderr = text("stderr");
                let output = match (stdout.is_empty(), stderr.is_empty()) {
                    (true, true) => text("output").to_string(),
                    (false, true) => stdout.to_string(),
                    (true, false) => stderr.to_string(),
                    (false, false) => format!("{}\n{}", stdout, stderr),
                };
                let exit_code = map
                    .get("exit_code")
                    .or_else(|| map.get("exitCode"))
                    .and_then(Value::as_i64)
                    .unwrap_or(0) as i32;
                let duration_ms = map
                    .get("duration_ms")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                Self {
                    output,
                    exit_code,
                    duration_ms,
                }
            }
            other => Self::text(other.to_string()),
        }
    }
}

/// Lifecycle points hooks can be registered against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEventKind {
    BeforeToolUse,
    AfterToolUse,
    IterationStop,
    SubTaskStop,
}

impl std::fmt::Display for HookEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookEventKind::BeforeToolUse => write!(f, "before_tool_use"),
            HookEventKind::AfterToolUse => write!(f, "after_tool_use"),
            HookEventKind::IterationStop => write!(f, "iteration_stop"),
            HookEventKind::SubTaskStop => write!(f, "sub_task_stop"),
        }
    }
}

/// Events emitted by the execution engine
#[derive(Debug, Clone, PartialEq)]
pub enum HookEvent {
    BeforeToolUse { call: ToolCall },
    AfterToolUse { call: ToolCall, response: ToolResponse },
    IterationStop { session_id: Option<String> },
    SubTaskStop { stop_hook_active: bool },
}

impl HookEvent {
    pub fn kind(&self) -> HookEventKind {
        match self {
            HookEvent::BeforeToolUse { .. } => HookEventKind::BeforeToolUse,
            HookEvent::AfterToolUse { .. } => HookEventKind::AfterToolUse,
            HookEvent::IterationStop { .. } => HookEventKind::IterationStop,
            HookEvent::SubTaskStop { .. } => HookEventKind::SubTaskStop,
        }
    }

    pub fn tool(&self) -> Option<&ToolCall> {
        match self {
            HookEvent::BeforeToolUse { call } | HookEvent::AfterToolUse { call, .. } => Some(call),
            _ => None,
        }
    }
}

/// Hook verdict. Only `Deny` on a before-tool-use event has an effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HookDirective {
    #[default]
    Allow,
    Deny {
        reason: String,
    },
}

impl HookDirective {
    pub fn deny(reason: impl Into<String>) -> Self {
        HookDirective::Deny {
            reason: reason.into(),
        }
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, HookDirective::Deny { .. })
    }
}

/// Per-call context handed to hooks
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    /// Zero-based loop iteration the event belongs to
    pub iteration: usize,
}

impl HookContext {
    pub fn new(iteration: usize) -> Self {
        Self { iteration }
    }
}

#[derive(Error, Debug)]
pub enum EventMappingError {
    #[error("Unknown hook event name: {0}")]
    UnknownEvent(String),

    #[error("Tool event '{0}' has no tool_name")]
    MissingToolName(String),
}

/// Loosely-typed event payload as engines emit it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawHookEvent {
    pub hook_event_name: String,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Value,
    #[serde(default)]
    pub tool_response: Value,
    #[serde(default)]
    pub tool_use_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub stop_hook_active: bool,
}

impl RawHookEvent {
    /// Convert to the typed event at the engine boundary
    pub fn into_event(self) -> Result<HookEvent, EventMappingError> {
        let name = self.hook_event_name.as_str();
        match name {
            "PreToolUse" | "before_tool_use" | "PostToolUse" | "after_tool_use" => {
                let tool_name = self
                    .tool_name
                    .as_deref()
                    .ok_or_else(|| EventMappingError::MissingToolName(name.to_string()))?;
                let call = ToolCall::from_raw(tool_name, &self.tool_input);
                if matches!(name, "PreToolUse" | "before_tool_use") {
                    Ok(HookEvent::BeforeToolUse { call })
                } else {
                    Ok(HookEvent::AfterToolUse {
                        call,
                        response: ToolResponse::from_value(&self.tool_response),
                    })
                }
            }
            "Stop" | "iteration_stop" => Ok(HookEvent::IterationStop {
                session_id: self.session_id,
            }),
            "SubagentStop" | "sub_task_stop" => Ok(HookEvent::SubTaskStop {
                stop_hook_active: self.stop_hook_active,
            }),
            other => Err(EventMappingError::UnknownEvent(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_raw_maps_file_tools() {
        let call = ToolCall::from_raw(
            "Edit",
            &json!({"file_path": "src/lib.rs", "old_string": "a", "new_string": "b\nc"}),
        );
        assert_eq!(call.name, ToolName::Edit);
        assert_eq!(call.file_path(), Some("src/lib.rs"));
        assert!(call.command().is_none());
    }

    #[test]
    fn test_unknown_tool_keeps_name() {
        let call = ToolCall::from_raw("WebFetch", &json!({"url": "https://example.com"}));
        assert_eq!(call.name, ToolName::Other("WebFetch".into()));
        assert_eq!(call.input, ToolInput::Other);
        assert_eq!(call.raw_input["url"], "https://example.com");
    }

    #[test]
    fn test_tool_response_from_object() {
        let response = ToolResponse::from_value(&json!({
            "stdout": "ok",
            "stderr": "warning: unused",
            "exit_code": 101
        }));
        assert_eq!(response.output, "ok\nwarning: unused");
        assert_eq!(response.exit_code, 101);
    }

    #[test]
    fn test_raw_event_mapping() {
        let raw: RawHookEvent = serde_json::from_value(json!({
            "hook_event_name": "PostToolUse",
            "tool_name": "Bash",
            "tool_input": {"command": "cargo test"},
            "tool_response": "test result: ok. 1 passed; 0 failed; 0 ignored"
        }))
        .unwrap();

        match raw.into_event().unwrap() {
            HookEvent::AfterToolUse { call, response } => {
                assert_eq!(call.command(), Some("cargo test"));
                assert!(response.output.contains("1 passed"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_raw_event_errors() {
        let raw: RawHookEvent =
            serde_json::from_value(json!({"hook_event_name": "Notification"})).unwrap();
        assert!(matches!(
            raw.into_event(),
            Err(EventMappingError::UnknownEvent(_))
        ));

        let raw: RawHookEvent =
            serde_json::from_value(json!({"hook_event_name": "PreToolUse"})).unwrap();
        assert!(matches!(
            raw.into_event(),
            Err(EventMappingError::MissingToolName(_))
        ));
    }
}
