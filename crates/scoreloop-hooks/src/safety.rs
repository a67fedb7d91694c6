use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use crate::event::{HookDirective, HookEvent, HookEventKind, ToolName};
use crate::set::{HookSet, ToolMatcher};

/// Shell fragments that are never allowed to run
pub const DANGEROUS_COMMAND_PATTERNS: &[&str] = &[
    "rm -rf /",
    "rm -rf /*",
    "rm -rf ~",
    "rm -rf $home",
    "dd if=/dev/zero",
    "dd if=/dev/random",
    "mkfs.",
    "> /dev/sda",
    ":(){:|:&};:",
    ":(){ :|:& };:",
    "chmod 777 /",
    "chmod -r 777",
    "git reset --hard",
    "git clean -fdx",
    "drop table",
    "drop database",
    "delete from",
    "truncate table",
];

/// Reported for a force push that targets main or master
pub const FORCE_PUSH_PROTECTED: &str = "git push --force to main/master";

lazy_static! {
    static ref COMMAND_SEPARATOR: Regex = Regex::new(r"&&|\|\||[;|\n]").unwrap();
    static ref FORCE_FLAG: Regex =
        Regex::new(r"^(--force(-with-lease(=\S*)?|-if-includes)?|-[a-z]*f[a-z]*)$").unwrap();
    static ref PROTECTED_REF: Regex =
        Regex::new(r"^\+?(\S*:)?(refs/heads/)?(main|master)$").unwrap();
}

/// Path fragments that file tools must not write to
pub const SENSITIVE_PATHS: &[&str] = &[
    "/etc/",
    "/usr/",
    "/bin/",
    "/sbin/",
    "/boot/",
    "/root/",
    ".ssh/",
    ".gnupg/",
    ".env",
    "credentials",
    "secrets",
];

/// First destructive pattern found in the command, case-insensitive
pub fn dangerous_pattern(command: &str) -> Option<&'static str> {
    let lowered = command.to_lowercase();
    DANGEROUS_COMMAND_PATTERNS
        .iter()
        .copied()
        .find(|pattern| lowered.contains(pattern))
        .or_else(|| force_pushes_protected_branch(&lowered).then_some(FORCE_PUSH_PROTECTED))
}

/// A `git push` in any segment of the command line with a force flag (or a
/// `+` refspec) and main/master as a target, in any argument order
fn force_pushes_protected_branch(lowered: &str) -> bool {
    COMMAND_SEPARATOR.split(lowered).any(|segment| {
        let tokens: Vec<&str> = segment.split_whitespace().collect();
        let Some(git) = tokens.iter().position(|t| *t == "git" || t.ends_with("/git")) else {
            return false;
        };
        let Some(push) = tokens[git..].iter().position(|t| *t == "push") else {
            return false;
        };
        let args = &tokens[git + push + 1..];

        let forced = args
            .iter()
            .any(|arg| FORCE_FLAG.is_match(arg) || (arg.starts_with('+') && arg.len() > 1));
        forced && args.iter().any(|arg| PROTECTED_REF.is_match(arg))
    })
}

/// First sensitive fragment found in the path, case-insensitive
pub fn sensitive_fragment(path: &str) -> Option<&'static str> {
    let lowered = path.to_lowercase();
    SENSITIVE_PATHS
        .iter()
        .copied()
        .find(|fragment| lowered.contains(fragment))
}

fn check_tool_call(event: &HookEvent) -> HookDirective {
    let Some(call) = event.tool() else {
        return HookDirective::Allow;
    };

    match call.name {
        ToolName::Bash => {
            if let Some(pattern) = call.command().and_then(dangerous_pattern) {
                warn!(pattern, "Blocked dangerous command");
                return HookDirective::deny(format!(
                    "Blocked dangerous command pattern: {}",
                    pattern
                ));
            }
        }
        ToolName::Write | ToolName::Edit => {
            if let Some(path) = call.file_path() {
                if let Some(fragment) = sensitive_fragment(path) {
                    warn!(path, fragment, "Blocked write to sensitive path");
                    return HookDirective::deny(format!(
                        "Blocked modification of sensitive path: {}",
                        path
                    ));
                }
            }
        }
        _ => {}
    }

    HookDirective::Allow
}

/// Before-tool-use hooks that veto destructive commands and sensitive writes
pub fn create_safety_hooks() -> HookSet {
    HookSet::new().with(
        HookEventKind::BeforeToolUse,
        "safety",
        ToolMatcher::tools([ToolName::Bash, ToolName::Write, ToolName::Edit]),
        |event, _, _| check_tool_call(event),
    )
}
