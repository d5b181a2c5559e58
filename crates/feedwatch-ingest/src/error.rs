//! Error types for data loading

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while loading evaluation inputs
#[derive(Error, Debug)]
pub enum IngestError {
    /// The daily upload log is missing entirely; the run cannot proceed
    #[error("Files data not found for {date} at {path}")]
    FilesNotFound {
        /// Date the run asked for
        date: NaiveDate,
        /// Path that was probed
        path: PathBuf,
    },

    /// No operator feedback exists for the date; nothing to evaluate against
    #[error("No feedback rows found for {date}")]
    FeedbackNotFound {
        /// Date the run asked for
        date: NaiveDate,
    },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A data file exists but is not valid JSON
    #[error("Malformed data file: {0}")]
    Json(#[from] serde_json::Error),
}
