//! # scoreloop-agent
//!
//! The boundary between the loop controller and an execution engine.
//!
//! An engine takes a prompt, runs its tools, and reports every tool call
//! through the supplied [`HookSet`](scoreloop_hooks::HookSet). The loop never
//! sees the engine's work directly; it only sees what the hooks recorded.
//!
//! [`ReplayAgent`] is a built-in engine that replays a recorded event
//! transcript, for offline scoring and tests.

mod output;
mod replay;
mod traits;

pub use output::AgentOutput;
pub use replay::{ReplayAgent, ReplayError};
pub use traits::{Agent, AgentConfig, AgentError};
