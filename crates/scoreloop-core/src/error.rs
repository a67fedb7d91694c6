use thiserror::Error;

/// Errors that stop a loop before it starts.
///
/// Failures during a run end the loop with an outcome instead.
#[derive(Error, Debug)]
pub enum LoopError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
}
