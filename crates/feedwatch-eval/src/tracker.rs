//! Iteration tracker - the append-only tuning audit trail
//!
//! Every scored run lands here as one [`MetricSnapshot`], keyed by the
//! ruleset version that produced it. Snapshots are never mutated or
//! removed, so a regression stays visible in the history instead of being
//! papered over by the next run. Comparing two ruleset versions reads the
//! most recent snapshot of each and reports how the scores moved.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use feedwatch_domain::{MetricSnapshot, Scores};

/// Errors that can occur while recording or comparing snapshots
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A comparison referenced a ruleset version with no recorded snapshot
    #[error("No snapshot recorded for ruleset version '{0}'")]
    UnknownVersion(String),

    /// History file could not be read or written
    #[error("History I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// History file contents could not be parsed
    #[error("History parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Score movement between two ruleset versions
///
/// Deltas are `candidate - baseline` per metric, and only exist where both
/// sides are defined: when either run left a metric undefined there is no
/// movement to report, which is a different statement than a delta of 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    /// Version the comparison starts from
    pub baseline_version: String,

    /// Version being judged against the baseline
    pub candidate_version: String,

    /// Scores of the baseline's most recent snapshot
    pub baseline: Scores,

    /// Scores of the candidate's most recent snapshot
    pub candidate: Scores,

    /// Precision movement, when defined on both sides
    pub precision_delta: Option<f64>,

    /// Recall movement, when defined on both sides
    pub recall_delta: Option<f64>,

    /// F1 movement, when defined on both sides
    pub f1_delta: Option<f64>,
}

impl MetricDelta {
    /// Compare two snapshots, candidate against baseline
    pub fn between(baseline: &MetricSnapshot, candidate: &MetricSnapshot) -> Self {
        Self {
            baseline_version: baseline.ruleset_version.clone(),
            candidate_version: candidate.ruleset_version.clone(),
            baseline: baseline.scores,
            candidate: candidate.scores,
            precision_delta: shift(baseline.scores.precision, candidate.scores.precision),
            recall_delta: shift(baseline.scores.recall, candidate.scores.recall),
            f1_delta: shift(baseline.scores.f1, candidate.scores.f1),
        }
    }
}

/// Candidate minus baseline, undefined when either side is undefined
fn shift(baseline: Option<f64>, candidate: Option<f64>) -> Option<f64> {
    Some(candidate? - baseline?)
}

/// Append-only log of scored evaluation runs
///
/// Backed by a JSON file when opened against a data directory, or purely
/// in-memory for tests and one-off runs. Every [`record`](Self::record)
/// appends and, when file-backed, persists immediately: a snapshot that was
/// reported to the operator is on disk.
#[derive(Debug)]
pub struct IterationTracker {
    snapshots: Vec<MetricSnapshot>,
    path: Option<PathBuf>,
}

impl IterationTracker {
    /// Create a tracker that never touches disk
    pub fn in_memory() -> Self {
        Self {
            snapshots: Vec::new(),
            path: None,
        }
    }

    /// Open the tracker under a data directory
    ///
    /// Reads `Evaluation/history.json` when it exists; a missing file is an
    /// empty history, not an error, so the first run of a fresh setup works.
    pub fn open(data_dir: &Path) -> Result<Self, TrackerError> {
        Self::with_path(data_dir.join("Evaluation").join("history.json"))
    }

    /// Open the tracker at an explicit history file path
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self, TrackerError> {
        let path = path.into();
        let snapshots = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            debug!(path = %path.display(), "no history file, starting empty");
            Vec::new()
        };

        Ok(Self {
            snapshots,
            path: Some(path),
        })
    }

    /// Append a snapshot to the history
    ///
    /// Existing snapshots are never touched; when file-backed, the extended
    /// history is written out before this returns.
    pub fn record(&mut self, snapshot: MetricSnapshot) -> Result<(), TrackerError> {
        debug!(
            id = %snapshot.id,
            version = %snapshot.ruleset_version,
            "recording snapshot"
        );
        self.snapshots.push(snapshot);
        self.persist()
    }

    /// All snapshots, oldest first
    pub fn history(&self) -> &[MetricSnapshot] {
        &self.snapshots
    }

    /// Number of recorded snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Whether nothing was recorded yet
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Most recent snapshot recorded under a ruleset version
    ///
    /// Recency is judged by snapshot id, which is time-ordered, so this
    /// stays correct even for histories merged from several machines.
    pub fn latest_for(&self, version: &str) -> Option<&MetricSnapshot> {
        self.snapshots
            .iter()
            .filter(|s| s.ruleset_version == version)
            .max_by_key(|s| s.id)
    }

    /// Score movement from one ruleset version to another
    ///
    /// Compares the most recent snapshot of each version. A version with no
    /// snapshot in the history is an error: there is nothing to compare.
    pub fn delta(&self, baseline: &str, candidate: &str) -> Result<MetricDelta, TrackerError> {
        let baseline_snapshot = self
            .latest_for(baseline)
            .ok_or_else(|| TrackerError::UnknownVersion(baseline.to_string()))?;
        let candidate_snapshot = self
            .latest_for(candidate)
            .ok_or_else(|| TrackerError::UnknownVersion(candidate.to_string()))?;

        Ok(MetricDelta::between(baseline_snapshot, candidate_snapshot))
    }

    fn persist(&self) -> Result<(), TrackerError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.snapshots)?)?;
        Ok(())
    }
}
