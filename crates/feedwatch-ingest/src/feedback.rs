//! Operator feedback store
//!
//! Ground truth comes from operators reporting incidents after the fact.
//! Each report is one row: date, source, and the severity the incident
//! deserved. Rows accumulate in `Feedback/feedback.json`; a day's ground
//! truth is the rows for that date folded into a label per source.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use feedwatch_domain::{GroundTruth, Severity, SourceId};

use crate::error::IngestError;

/// One operator incident report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRow {
    /// Day the incident occurred
    pub date: NaiveDate,
    /// Source the incident was reported against
    pub source_id: SourceId,
    /// Severity the operator assigned
    pub severity: Severity,
}

/// Read access to the accumulated feedback rows
///
/// The store is read-only from the evaluation side: runs consume labels,
/// they never write them. Labels only exist for sources operators actually
/// reported on; everything else is implicitly uneventful, which the
/// confusion evaluator accounts for.
pub struct FeedbackStore {
    path: PathBuf,
}

impl FeedbackStore {
    /// Open the store under a data directory
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("Feedback").join("feedback.json"),
        }
    }

    /// Ground truth for one date
    ///
    /// Fails with [`IngestError::FeedbackNotFound`] when no rows exist for
    /// the date (including when the feedback file itself does not exist):
    /// an evaluation without labels would score nothing.
    pub fn labeled_cases(&self, date: NaiveDate) -> Result<GroundTruth, IngestError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "feedback file does not exist");
            return Err(IngestError::FeedbackNotFound { date });
        }

        let rows: Vec<FeedbackRow> = serde_json::from_str(&fs::read_to_string(&self.path)?)?;

        let mut truth = GroundTruth::new(date);
        for row in rows.into_iter().filter(|row| row.date == date) {
            truth.insert(row.source_id, row.severity);
        }

        if truth.is_empty() {
            return Err(IngestError::FeedbackNotFound { date });
        }

        debug!(date = %date, labels = truth.len(), "loaded ground truth");
        Ok(truth)
    }
}
