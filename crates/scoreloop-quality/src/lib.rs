//! # scoreloop-quality
//!
//! Deterministic scoring of an iteration's evidence.
//!
//! [`assess`] maps an [`Evidence`](scoreloop_evidence::Evidence) snapshot and
//! a [`ScoringConfig`] to an [`Assessment`]. It is a pure function: the same
//! evidence always yields the same score, band and improvement list.

mod assessment;
mod assessor;
mod config;
mod prompts;

pub use assessment::{Assessment, AssessmentComparison, Dimension, QualityBand};
pub use assessor::{assess, compare, CRITICAL_MAJORITY_FAILING, ERROR_MARKERS};
pub use config::{DimensionWeights, ScoringConfig};
pub use prompts::{IterationPrompts, PreviousIteration};
