//! Labels module - ground-truth and predicted severity sets

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::severity::Severity;
use crate::source::SourceId;

/// Human-labeled severities for one evaluation date
///
/// Built once per run from operator feedback and never touched by the
/// classifier. A source absent from the map carries no explicit label;
/// the confusion evaluator treats it as `AllGood` (documented there).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    /// The date these labels cover
    pub date: NaiveDate,

    labels: BTreeMap<SourceId, Severity>,
}

impl GroundTruth {
    /// Create an empty label set for a date
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            labels: BTreeMap::new(),
        }
    }

    /// Record the labeled severity for a source
    ///
    /// When a source was labeled more than once the more critical severity
    /// wins, so repeated feedback rows never downgrade a label.
    pub fn insert(&mut self, source_id: SourceId, severity: Severity) {
        self.labels
            .entry(source_id)
            .and_modify(|current| *current = (*current).max(severity))
            .or_insert(severity);
    }

    /// Labeled severity for a source, if the source was labeled
    pub fn get(&self, source_id: &SourceId) -> Option<Severity> {
        self.labels.get(source_id).copied()
    }

    /// Iterate labels in source-id order
    pub fn iter(&self) -> impl Iterator<Item = (&SourceId, Severity)> {
        self.labels.iter().map(|(id, severity)| (id, *severity))
    }

    /// Sources that were labeled, in order
    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.labels.keys()
    }

    /// Number of labeled sources
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether no source was labeled
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Classifier-predicted severities for one run
///
/// Produced fresh per run; only successfully classified sources appear.
/// Sources whose classification failed are tracked separately and never
/// enter this set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionSet {
    labels: BTreeMap<SourceId, Severity>,
}

impl PredictionSet {
    /// Create an empty prediction set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the predicted severity for a source
    pub fn insert(&mut self, source_id: SourceId, severity: Severity) {
        self.labels.insert(source_id, severity);
    }

    /// Predicted severity for a source, if it was classified
    pub fn get(&self, source_id: &SourceId) -> Option<Severity> {
        self.labels.get(source_id).copied()
    }

    /// Iterate predictions in source-id order
    pub fn iter(&self) -> impl Iterator<Item = (&SourceId, Severity)> {
        self.labels.iter().map(|(id, severity)| (id, *severity))
    }

    /// Sources that were classified, in order
    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.labels.keys()
    }

    /// Number of classified sources
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether nothing was classified
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(SourceId, Severity)> for PredictionSet {
    fn from_iter<T: IntoIterator<Item = (SourceId, Severity)>>(iter: T) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_truth_repeated_labels_keep_worst() {
        let mut truth = GroundTruth::new("2025-09-10".parse().unwrap());
        truth.insert(SourceId::new("220504"), Severity::Urgent);
        truth.insert(SourceId::new("220504"), Severity::AttentionRequired);

        assert_eq!(truth.len(), 1);
        assert_eq!(
            truth.get(&SourceId::new("220504")),
            Some(Severity::Urgent)
        );
    }

    #[test]
    fn test_prediction_set_iterates_in_source_order() {
        let predictions: PredictionSet = [
            (SourceId::new("220505"), Severity::Urgent),
            (SourceId::new("195385"), Severity::AllGood),
        ]
        .into_iter()
        .collect();

        let ids: Vec<&str> = predictions.sources().map(SourceId::as_str).collect();
        assert_eq!(ids, vec!["195385", "220505"]);
    }
}
