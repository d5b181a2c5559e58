//! Feedwatch Evaluation Layer
//!
//! Orchestrates the measure half of the tuning loop: take one labeled day,
//! classify its sources through whatever analyzer the caller configured,
//! score the predictions against operator ground truth, and append the
//! result to an audit trail that survives across runs.
//!
//! - [`EvalHarness`]: one labeled date in, one scored [`EvaluationRun`] out
//! - [`IterationTracker`]: append-only history of [`MetricSnapshot`]s with
//!   version-to-version [`MetricDelta`] comparison
//!
//! The classifier is non-deterministic; everything downstream of its output
//! is not. Two runs over the same predictions always score identically, and
//! a source the classifier failed on is excluded from scoring rather than
//! coerced to a severity.
//!
//! [`MetricSnapshot`]: feedwatch_domain::MetricSnapshot

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod harness;
pub mod tracker;

pub use error::EvalError;
pub use harness::{build_cases, CaseRow, EvalHarness, EvaluationRun};
pub use tracker::{IterationTracker, MetricDelta, TrackerError};
