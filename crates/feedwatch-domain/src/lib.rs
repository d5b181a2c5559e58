//! Feedwatch Domain Layer
//!
//! This crate contains the core value objects and deterministic computations
//! for feedwatch's incident classification and evaluation loop. Everything
//! here is pure: no I/O, no clocks beyond id generation, no knowledge of the
//! classifier backing the predictions.
//!
//! ## Key Concepts
//!
//! - **Severity**: the three-level label a source gets for a day
//!   (ALL_GOOD < ATTENTION_REQUIRED < URGENT)
//! - **Incident / SourceReport**: what the classifier detected and why
//! - **GroundTruth / PredictionSet**: human labels vs classifier output
//! - **ConfusionCounts**: TP/FP/FN/TN tallies for one target class
//! - **Scores**: precision/recall/F1 with explicit undefined states
//! - **MetricSnapshot**: one immutable record in the tuning audit trail
//!
//! ## Architecture
//!
//! Infrastructure lives elsewhere: data loading in `feedwatch-ingest`, the
//! classifier adapter in `feedwatch-agent`, orchestration and history in
//! `feedwatch-eval`. This crate defines what they exchange and how runs are
//! scored, so the evaluation math can be tested without touching any of
//! them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod confusion;
pub mod incident;
pub mod labels;
pub mod metrics;
pub mod severity;
pub mod source;
pub mod upload;

// Re-exports for convenience
pub use confusion::{case_union, classify_case, evaluate, ConfusionCell, ConfusionCounts};
pub use incident::{DailyReport, Incident, IncidentKind, SourceReport};
pub use labels::{GroundTruth, PredictionSet};
pub use metrics::{MetricSnapshot, Scores, SnapshotId};
pub use severity::Severity;
pub use source::{SourceId, SourceProfile, VolumeStats};
pub use upload::FileRecord;
