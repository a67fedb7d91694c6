use async_trait::async_trait;
use scoreloop_hooks::{HookContext, HookSet};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::AgentOutput;

/// Errors that can occur during agent execution
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Agent I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Agent execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("Agent configuration error: {0}")]
    ConfigError(String),

    #[error("Agent execution failed: {0}")]
    ExecutionFailed(String),
}

/// Configuration for one engine invocation
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Working directory for the agent
    pub working_dir: PathBuf,
    /// Optional timeout (None = no limit)
    pub timeout: Option<Duration>,
    /// Model to use (if agent supports it)
    pub model: Option<String>,
    /// Cap on tool turns (if agent supports it)
    pub max_turns: Option<u32>,
    /// Zero-based loop iteration, forwarded to hooks
    pub iteration: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            working_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            timeout: None,
            model: None,
            max_turns: None,
            iteration: 0,
        }
    }
}

impl AgentConfig {
    pub fn new(working_dir: PathBuf) -> Self {
        Self {
            working_dir,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn with_iteration(mut self, iteration: usize) -> Self {
        self.iteration = iteration;
        self
    }

    /// Context handed to every hook call made under this config
    pub fn hook_context(&self) -> HookContext {
        HookContext::new(self.iteration)
    }
}

/// An execution engine the loop can drive
#[async_trait]
pub trait Agent: Send + Sync {
    /// Human-readable name of the engine
    fn name(&self) -> &str;

    /// Run the prompt to completion, reporting every tool call through `hooks`.
    ///
    /// Before-tool-use hooks may deny a call; the engine must then skip it.
    async fn execute(
        &self,
        prompt: &str,
        config: &AgentConfig,
        hooks: &HookSet,
    ) -> Result<AgentOutput, AgentError>;
}
