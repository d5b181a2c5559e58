//! Confusion evaluation module
//!
//! Implements the deterministic comparison between a ground-truth label set
//! and a prediction set for one target severity class. The classifier being
//! scored is non-deterministic; everything in this module is not. Identical
//! inputs always produce identical counts.

use serde::{Deserialize, Serialize};

use crate::labels::{GroundTruth, PredictionSet};
use crate::severity::Severity;
use crate::source::SourceId;

/// Outcome of scoring one source against the target class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfusionCell {
    /// Predicted target, labeled target
    TruePositive,
    /// Predicted target, labeled otherwise
    FalsePositive,
    /// Predicted otherwise, labeled target
    FalseNegative,
    /// Predicted otherwise, labeled otherwise
    TrueNegative,
}

impl ConfusionCell {
    /// Short result code as it appears in evaluation tables
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfusionCell::TruePositive => "TP",
            ConfusionCell::FalsePositive => "FP",
            ConfusionCell::FalseNegative => "FN",
            ConfusionCell::TrueNegative => "TN",
        }
    }
}

impl std::fmt::Display for ConfusionCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Confusion-matrix tallies for one evaluation run
///
/// Counts cover exactly the sources that were scored: every scored source
/// lands in exactly one cell, so the four counters always sum to the number
/// of scored sources. Sources whose classification failed are excluded
/// before counting and never appear here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    /// Sources correctly predicted as the target class
    pub true_positives: u64,
    /// Sources wrongly predicted as the target class
    pub false_positives: u64,
    /// Target-class sources the classifier missed
    pub false_negatives: u64,
    /// Sources correctly predicted as not the target class
    pub true_negatives: u64,
}

impl ConfusionCounts {
    /// Create zeroed counts
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one scored source to its cell
    pub fn record(&mut self, cell: ConfusionCell) {
        match cell {
            ConfusionCell::TruePositive => self.true_positives += 1,
            ConfusionCell::FalsePositive => self.false_positives += 1,
            ConfusionCell::FalseNegative => self.false_negatives += 1,
            ConfusionCell::TrueNegative => self.true_negatives += 1,
        }
    }

    /// Total number of scored sources
    pub fn total(&self) -> u64 {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }
}

/// Score one source against the target class
///
/// Either side may be absent: a source can appear in the ground truth but
/// not in the predictions (classification produced nothing for it) or in
/// the predictions but not in the ground truth (nobody labeled it). The
/// convention is that an absent side counts as `AllGood`, which matches how
/// operators label: only sources with incidents get feedback rows.
pub fn classify_case(
    actual: Option<Severity>,
    predicted: Option<Severity>,
    target: Severity,
) -> ConfusionCell {
    let actual_hit = actual.unwrap_or(Severity::AllGood) == target;
    let predicted_hit = predicted.unwrap_or(Severity::AllGood) == target;

    match (predicted_hit, actual_hit) {
        (true, true) => ConfusionCell::TruePositive,
        (true, false) => ConfusionCell::FalsePositive,
        (false, true) => ConfusionCell::FalseNegative,
        (false, false) => ConfusionCell::TrueNegative,
    }
}

/// Compare predictions against ground truth for one target class
///
/// Walks the union of the two source sets in source-id order and tallies
/// one cell per source via [`classify_case`]. Pure: no clocks, no I/O, no
/// randomness.
pub fn evaluate(
    truth: &GroundTruth,
    predictions: &PredictionSet,
    target: Severity,
) -> ConfusionCounts {
    let mut counts = ConfusionCounts::new();
    for (_, actual, predicted) in case_union(truth, predictions) {
        counts.record(classify_case(actual, predicted, target));
    }
    counts
}

/// Iterate the union of labeled and predicted sources in source-id order
///
/// Yields `(source_id, actual, predicted)` with `None` on whichever side
/// does not mention the source. Callers that need per-source rows (the
/// evaluation table) and callers that only need tallies both start here,
/// so the two can never disagree about which sources were scored.
pub fn case_union<'a>(
    truth: &'a GroundTruth,
    predictions: &'a PredictionSet,
) -> impl Iterator<Item = (&'a SourceId, Option<Severity>, Option<Severity>)> {
    let mut sources: Vec<&SourceId> = truth.sources().chain(predictions.sources()).collect();
    sources.sort();
    sources.dedup();

    sources
        .into_iter()
        .map(move |id| (id, truth.get(id), predictions.get(id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truth(labels: &[(&str, Severity)]) -> GroundTruth {
        let mut truth = GroundTruth::new("2025-09-10".parse().unwrap());
        for (id, severity) in labels {
            truth.insert(SourceId::new(*id), *severity);
        }
        truth
    }

    fn predictions(labels: &[(&str, Severity)]) -> PredictionSet {
        labels
            .iter()
            .map(|(id, severity)| (SourceId::new(*id), *severity))
            .collect()
    }

    #[test]
    fn test_mixed_outcome_counts() {
        // A labeled URGENT and predicted URGENT; B labeled ATTENTION_REQUIRED
        // but predicted URGENT.
        let truth = truth(&[
            ("A", Severity::Urgent),
            ("B", Severity::AttentionRequired),
        ]);
        let predictions = predictions(&[("A", Severity::Urgent), ("B", Severity::Urgent)]);

        let counts = evaluate(&truth, &predictions, Severity::Urgent);

        assert_eq!(counts.true_positives, 1);
        assert_eq!(counts.false_positives, 1);
        assert_eq!(counts.false_negatives, 0);
        assert_eq!(counts.true_negatives, 0);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_downgraded_prediction_is_false_negative() {
        let truth = truth(&[("195385", Severity::Urgent)]);
        let predictions = predictions(&[("195385", Severity::AttentionRequired)]);

        let counts = evaluate(&truth, &predictions, Severity::Urgent);

        assert_eq!(counts.true_positives, 0);
        assert_eq!(counts.false_negatives, 1);
        assert_eq!(counts.total(), 1);
    }

    #[test]
    fn test_absent_side_defaults_to_all_good() {
        // "X" was never labeled; "Y" was never classified.
        let truth = truth(&[("Y", Severity::Urgent)]);
        let predictions = predictions(&[("X", Severity::Urgent)]);

        assert_eq!(
            classify_case(None, Some(Severity::Urgent), Severity::Urgent),
            ConfusionCell::FalsePositive
        );
        assert_eq!(
            classify_case(Some(Severity::Urgent), None, Severity::Urgent),
            ConfusionCell::FalseNegative
        );

        let counts = evaluate(&truth, &predictions, Severity::Urgent);
        assert_eq!(counts.false_positives, 1);
        assert_eq!(counts.false_negatives, 1);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn test_case_union_is_sorted_and_deduplicated() {
        let truth = truth(&[("220505", Severity::Urgent), ("195385", Severity::AllGood)]);
        let predictions = predictions(&[
            ("220505", Severity::Urgent),
            ("220504", Severity::AllGood),
        ]);

        let ids: Vec<&str> = case_union(&truth, &predictions)
            .map(|(id, _, _)| id.as_str())
            .collect();

        assert_eq!(ids, vec!["195385", "220504", "220505"]);
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let truth = truth(&[
            ("220504", Severity::Urgent),
            ("220505", Severity::AttentionRequired),
            ("220506", Severity::AllGood),
        ]);
        let predictions = predictions(&[
            ("220504", Severity::Urgent),
            ("220505", Severity::Urgent),
            ("220506", Severity::AllGood),
        ]);

        let first = evaluate(&truth, &predictions, Severity::Urgent);
        let second = evaluate(&truth, &predictions, Severity::Urgent);
        assert_eq!(first, second);
    }
}
