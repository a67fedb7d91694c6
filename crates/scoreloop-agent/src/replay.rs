use async_trait::async_trait;
use scoreloop_hooks::{EventMappingError, HookEvent, HookSet, RawHookEvent};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

use crate::{Agent, AgentConfig, AgentError, AgentOutput};

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Failed to read transcript {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON on transcript line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unusable event on transcript line {line}: {source}")]
    Mapping {
        line: usize,
        #[source]
        source: EventMappingError,
    },
}

#[derive(Debug, Clone)]
struct ReplayStep {
    event: HookEvent,
    correlation_id: Option<String>,
}

/// Engine that replays a recorded tool-event transcript through the hooks.
///
/// A transcript is split into rounds at each iteration-stop event. Call N
/// replays round N; once rounds run out the last one is repeated.
pub struct ReplayAgent {
    name: String,
    rounds: Vec<Vec<ReplayStep>>,
    event_delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ReplayAgent {
    /// Build from raw events already in memory
    pub fn new(events: Vec<RawHookEvent>) -> Result<Self, ReplayError> {
        let mut steps = Vec::with_capacity(events.len());
        for (idx, raw) in events.into_iter().enumerate() {
            steps.push(Self::step(raw, idx + 1)?);
        }
        Ok(Self::from_steps(steps))
    }

    /// Load a JSON-lines transcript, one raw event per line
    pub fn from_jsonl(path: &Path) -> Result<Self, ReplayError> {
        let io_err = |source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        };
        let reader = BufReader::new(File::open(path).map_err(io_err)?);

        let mut steps = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }
            let raw: RawHookEvent = serde_json::from_str(&line).map_err(|source| {
                ReplayError::Parse {
                    line: idx + 1,
                    source,
                }
            })?;
            steps.push(Self::step(raw, idx + 1)?);
        }

        debug!(path = %path.display(), events = steps.len(), "Loaded replay transcript");
        Ok(Self::from_steps(steps))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sleep between events, to simulate a slow engine
    pub fn with_event_delay(mut self, delay: Duration) -> Self {
        self.event_delay = Some(delay);
        self
    }

    pub fn round_count(&self) -> usize {
        self.rounds.len()
    }

    fn step(raw: RawHookEvent, line: usize) -> Result<ReplayStep, ReplayError> {
        let correlation_id = raw.tool_use_id.clone();
        let event = raw
            .into_event()
            .map_err(|source| ReplayError::Mapping { line, source })?;
        Ok(ReplayStep {
            event,
            correlation_id,
        })
    }

    fn from_steps(steps: Vec<ReplayStep>) -> Self {
        let mut rounds = Vec::new();
        let mut current = Vec::new();
        for step in steps {
            let ends_round = matches!(step.event, HookEvent::IterationStop { .. });
            current.push(step);
            if ends_round {
                rounds.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            rounds.push(current);
        }

        Self {
            name: "replay".to_string(),
            rounds,
            event_delay: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Agent for ReplayAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(
        &self,
        prompt: &str,
        config: &AgentConfig,
        hooks: &HookSet,
    ) -> Result<AgentOutput, AgentError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let round = self
            .rounds
            .get(call)
            .or_else(|| self.rounds.last())
            .ok_or_else(|| AgentError::ExecutionFailed("Replay transcript is empty".into()))?;

        debug!(
            agent = self.name(),
            round = call.min(self.rounds.len() - 1),
            prompt_len = prompt.len(),
            "Replaying transcript round"
        );

        let start = Instant::now();
        let ctx = config.hook_context();
        let mut output = AgentOutput::default();
        let mut denied_ids: HashSet<String> = HashSet::new();
        let mut skip_next_after = false;
        let mut turns = 0u32;
        let mut stopped = false;

        for step in round {
            if let Some(limit) = config.timeout {
                if start.elapsed() > limit {
                    return Err(AgentError::Timeout(limit));
                }
            }
            if let Some(delay) = self.event_delay {
                tokio::time::sleep(delay).await;
            }

            let correlation_id = step.correlation_id.as_deref();
            match &step.event {
                HookEvent::BeforeToolUse { .. } => {
                    turns += 1;
                    if config.max_turns.is_some_and(|max| turns > max) {
                        output.stop_reason = Some("max_turns".into());
                        break;
                    }
                }
                HookEvent::AfterToolUse { .. } => {
                    let denied = match correlation_id {
                        Some(id) => denied_ids.contains(id),
                        None => std::mem::take(&mut skip_next_after),
                    };
                    if denied {
                        continue;
                    }
                }
                HookEvent::IterationStop { session_id } => {
                    output.session_id = session_id.clone();
                    stopped = true;
                }
                HookEvent::SubTaskStop { .. } => {}
            }

            let directive = hooks.dispatch(&step.event, correlation_id, &ctx);
            output.event_count += 1;

            if directive.is_deny() && matches!(step.event, HookEvent::BeforeToolUse { .. }) {
                output.denied_count += 1;
                match correlation_id {
                    Some(id) => {
                        denied_ids.insert(id.to_string());
                    }
                    None => skip_next_after = true,
                }
            }
        }

        if !stopped {
            hooks.dispatch(&HookEvent::IterationStop { session_id: None }, None, &ctx);
            output.event_count += 1;
        }

        output.duration = start.elapsed();
        if output.stop_reason.is_none() {
            output.stop_reason = Some("end_turn".into());
        }

        info!(
            agent = self.name(),
            events = output.event_count,
            denied = output.denied_count,
            "Replay finished"
        );
        Ok(output)
    }
}
