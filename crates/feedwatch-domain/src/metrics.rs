//! Metrics module - precision, recall, and F1 over confusion counts
//!
//! Metric values are `Option<f64>`: `None` means the metric is undefined
//! for the counts at hand (a zero denominator), which is a different
//! statement than a score of 0.0 or 1.0. Small labeled sets hit these
//! degenerate cases constantly, and coercing them to a number would make a
//! tuning iteration look like progress or regression that never happened.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::confusion::ConfusionCounts;

/// Derived classification quality scores for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    /// TP / (TP + FP); `None` when nothing was predicted as the target
    pub precision: Option<f64>,
    /// TP / (TP + FN); `None` when nothing was labeled as the target
    pub recall: Option<f64>,
    /// Harmonic mean of precision and recall; `None` unless both are
    /// defined and at least one is positive
    pub f1: Option<f64>,
}

impl Scores {
    /// Compute scores from confusion tallies
    pub fn from_counts(counts: &ConfusionCounts) -> Self {
        let precision = ratio(
            counts.true_positives,
            counts.true_positives + counts.false_positives,
        );
        let recall = ratio(
            counts.true_positives,
            counts.true_positives + counts.false_negatives,
        );

        let f1 = match (precision, recall) {
            (Some(p), Some(r)) if p + r > 0.0 => Some(2.0 * p * r / (p + r)),
            _ => None,
        };

        Self {
            precision,
            recall,
            f1,
        }
    }

    /// Whether all three metrics are defined
    pub fn is_complete(&self) -> bool {
        self.precision.is_some() && self.recall.is_some() && self.f1.is_some()
    }
}

/// Numerator over denominator, undefined when the denominator is zero
fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

/// Unique identifier for a metric snapshot based on UUIDv7
///
/// UUIDv7 keeps snapshot ids chronologically sortable, so the tuning audit
/// trail orders correctly even when histories from several machines are
/// merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotId(u128);

impl SnapshotId {
    /// Generate a new UUIDv7-based snapshot id
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Parse a snapshot id from its UUID string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid snapshot id: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Get the timestamp component (milliseconds since Unix epoch)
    pub fn timestamp_millis(&self) -> u64 {
        // UUIDv7: top 48 bits are a Unix millisecond timestamp
        (self.0 >> 80) as u64
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl Serialize for SnapshotId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SnapshotId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_string(&s).map_err(serde::de::Error::custom)
    }
}

/// One immutable record in the tuning audit trail
///
/// A snapshot captures the outcome of scoring one evaluation run under one
/// ruleset version. Snapshots are append-only: a recorded snapshot is never
/// mutated, so regressions stay visible in the history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Unique, chronologically sortable id
    pub id: SnapshotId,

    /// Opaque token naming the ruleset/prompt version that produced the run
    pub ruleset_version: String,

    /// When the snapshot was recorded (seconds since Unix epoch)
    pub recorded_at: u64,

    /// Derived quality scores
    pub scores: Scores,

    /// Raw confusion tallies the scores were derived from
    pub counts: ConfusionCounts,

    /// Sources excluded from the tallies because classification failed
    pub unscored: u64,
}

impl MetricSnapshot {
    /// Record a snapshot for a run, stamped now
    pub fn new(
        ruleset_version: impl Into<String>,
        counts: ConfusionCounts,
        unscored: u64,
    ) -> Self {
        let id = SnapshotId::new();
        Self {
            id,
            ruleset_version: ruleset_version.into(),
            recorded_at: id.timestamp_millis() / 1000,
            scores: Scores::from_counts(&counts),
            counts,
            unscored,
        }
    }

    /// Number of sources that entered the confusion tallies
    pub fn scored(&self) -> u64 {
        self.counts.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(tp: u64, fp: u64, fn_: u64, tn: u64) -> ConfusionCounts {
        ConfusionCounts {
            true_positives: tp,
            false_positives: fp,
            false_negatives: fn_,
            true_negatives: tn,
        }
    }

    #[test]
    fn test_scores_mixed_case() {
        // TP=1 FP=1 FN=0: precision 0.5, recall 1.0, f1 = 2/3.
        let scores = Scores::from_counts(&counts(1, 1, 0, 0));

        assert_eq!(scores.precision, Some(0.5));
        assert_eq!(scores.recall, Some(1.0));
        let f1 = scores.f1.unwrap();
        assert!((f1 - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_recall_is_defined() {
        // One urgent source, predicted non-urgent: recall is 0.0, a real
        // score, while precision has no denominator and stays undefined.
        let scores = Scores::from_counts(&counts(0, 0, 1, 0));

        assert_eq!(scores.recall, Some(0.0));
        assert_eq!(scores.precision, None);
        assert_eq!(scores.f1, None);
    }

    #[test]
    fn test_precision_undefined_without_positive_predictions() {
        let scores = Scores::from_counts(&counts(0, 0, 0, 5));

        assert_eq!(scores.precision, None);
        assert_eq!(scores.recall, None);
        assert_eq!(scores.f1, None);
        assert!(!scores.is_complete());
    }

    #[test]
    fn test_f1_undefined_when_both_components_zero() {
        // Precision and recall both defined but both 0.0: the harmonic mean
        // divides by zero, so f1 stays undefined rather than becoming 0.0.
        let scores = Scores::from_counts(&counts(0, 2, 3, 0));

        assert_eq!(scores.precision, Some(0.0));
        assert_eq!(scores.recall, Some(0.0));
        assert_eq!(scores.f1, None);
    }

    #[test]
    fn test_perfect_scores() {
        let scores = Scores::from_counts(&counts(5, 0, 0, 2));

        assert_eq!(scores.precision, Some(1.0));
        assert_eq!(scores.recall, Some(1.0));
        assert_eq!(scores.f1, Some(1.0));
        assert!(scores.is_complete());
    }

    #[test]
    fn test_snapshot_id_chronological() {
        let first = SnapshotId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = SnapshotId::new();

        assert!(first < second);
        assert!(first.timestamp_millis() <= second.timestamp_millis());
    }

    #[test]
    fn test_snapshot_id_string_roundtrip() {
        let id = SnapshotId::new();
        let parsed = SnapshotId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);

        assert!(SnapshotId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_snapshot_serde_roundtrip() {
        let snapshot = MetricSnapshot::new("v2-volume-drop", counts(5, 0, 0, 0), 1);

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: MetricSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, snapshot);
        assert_eq!(parsed.scored(), 5);
        assert_eq!(parsed.unscored, 1);
        // Ids serialize as UUID strings, not raw integers.
        assert!(json.contains(&snapshot.id.to_string()));
    }
}
