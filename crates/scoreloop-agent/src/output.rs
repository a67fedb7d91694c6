use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What an engine reports back once a run completes.
///
/// The work itself is observed through hooks; this only carries run-level
/// bookkeeping.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentOutput {
    /// Number of hook events the engine emitted
    pub event_count: usize,
    /// Tool calls vetoed by a before-tool-use hook
    pub denied_count: usize,
    /// Engine-side session id, if it has one
    pub session_id: Option<String>,
    /// Why the engine stopped (e.g. "end_turn", "max_turns")
    pub stop_reason: Option<String>,
    /// Duration of execution
    #[serde(with = "duration_secs")]
    pub duration: Duration,
}

impl AgentOutput {
    pub fn new(event_count: usize, duration: Duration) -> Self {
        Self {
            event_count,
            duration,
            ..Default::default()
        }
    }

    pub fn with_stop_reason(mut self, reason: impl Into<String>) -> Self {
        self.stop_reason = Some(reason.into());
        self
    }

    /// True when the engine stopped on its own rather than hitting a cap
    pub fn completed(&self) -> bool {
        !matches!(self.stop_reason.as_deref(), Some("max_turns"))
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
