//! Feedwatch Ingest Layer
//!
//! Loads everything an evaluation run consumes from the data directory:
//!
//! - the daily upload log (`Files/<date>_20_00_UTC/files.json` plus the
//!   last-weekday baseline) via [`UploadIndex`]
//! - markdown source profiles (`Files/datasource_cvs/`) via [`ProfileParser`]
//! - operator feedback rows (`Feedback/feedback.json`) folded into a day's
//!   ground truth via [`FeedbackStore`]
//!
//! Loading is strict about run-level inputs (a missing upload log or an
//! unlabeled date aborts the run) and tolerant about row-level ones
//! (malformed records and absent profiles are logged and skipped).

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod feedback;
pub mod profiles;
pub mod uploads;

pub use error::IngestError;
pub use feedback::{FeedbackRow, FeedbackStore};
pub use profiles::ProfileParser;
pub use uploads::UploadIndex;
