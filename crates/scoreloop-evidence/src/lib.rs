//! # scoreloop-evidence
//!
//! Evidence accumulated from the agent's tool calls during one iteration.
//!
//! ## Key Types
//!
//! - [`EvidenceLedger`] - Mutable per-iteration record written by hooks
//! - [`Evidence`] - Snapshot handed to the quality assessor
//! - [`EvidenceSummary`] - Flat, serializable summary of a snapshot
//! - [`TestOutputInterpreter`] - Turns command output into [`TestResult`]s
//!
//! The ledger is created once per loop run and reset between iterations.
//! Reset keeps the session id and start time.

mod evidence;
pub mod interpreter;
mod ledger;
mod types;

pub use evidence::{Evidence, EvidenceSummary};
pub use interpreter::{HeuristicInterpreter, TestOutputInterpreter};
pub use ledger::{EvidenceLedger, SharedLedger};
pub use types::{
    CommandResult, FileAction, FileChange, SubtaskRecord, TestFramework, TestResult,
    ToolInvocation,
};
