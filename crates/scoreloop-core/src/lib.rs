//! Scored feedback loop.
//!
//! A [`LoopRunner`] hands a task to an engine, collects evidence of what the
//! engine did through hooks, scores it, and re-prompts with the top
//! improvements until the score passes or the loop stops making progress.

mod config;
mod context;
mod error;
mod loop_runner;
mod outcome;
mod termination;

pub use config::{LoopConfig, CONFIG_FILE_NAME, HARD_MAX_ITERATIONS};
pub use context::{IterationRecord, LoopContext};
pub use error::LoopError;
pub use loop_runner::{run_loop, IterationCallback, LoopRunner, WEIGHTS_WARNING};
pub use outcome::{LoopOutcome, LoopStatus};
pub use termination::{check_termination, is_oscillating, is_stagnating, TerminationReason};
