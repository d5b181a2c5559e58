//! Error types for the evaluation layer

use thiserror::Error;

use feedwatch_ingest::IngestError;

use crate::tracker::TrackerError;

/// Errors that can abort an evaluation run
///
/// Classification failures are deliberately not an error at this level: a
/// source the classifier could not handle is excluded from scoring and
/// reported as unscored, and the run still completes. Only missing inputs
/// and a broken audit trail abort a run.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A run-level input could not be loaded
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// The tuning history could not be read or written
    #[error("Tracker error: {0}")]
    Tracker(#[from] TrackerError),
}
