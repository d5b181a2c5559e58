//! Evaluation harness - one labeled day, one ruleset, one scored run
//!
//! Ties the layers together: load the day's inputs, fan the scoped sources
//! out over the classifier, compare predictions against ground truth, and
//! fold the outcome into a snapshot for the audit trail. The harness owns
//! the scoping rules (which sources get classified, which of those get
//! scored), so the CLI and the tests cannot disagree about them.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use feedwatch_agent::{ClassificationOutcome, Dispatcher, SourceCase, SourceFailure};
use feedwatch_domain::{
    case_union, classify_case, ConfusionCell, ConfusionCounts, GroundTruth, MetricSnapshot,
    Scores, Severity, SourceId,
};
use feedwatch_ingest::{FeedbackStore, IngestError, ProfileParser, UploadIndex};

use crate::error::EvalError;
use crate::tracker::IterationTracker;

/// Assemble classifier cases for the given sources
///
/// Each case bundles today's uploads, the last-weekday baseline, and the
/// source profile when one exists. A source absent from the upload log
/// still gets a case, just with no files: silence is exactly what the
/// classifier should be looking at for a source that was expected to
/// upload.
pub fn build_cases(
    date: NaiveDate,
    uploads: &UploadIndex,
    profiles: &ProfileParser,
    sources: &[SourceId],
) -> Result<Vec<SourceCase>, IngestError> {
    let mut cases = Vec::with_capacity(sources.len());
    for source_id in sources {
        cases.push(SourceCase {
            source_id: source_id.clone(),
            date,
            files: uploads.files_for(source_id).to_vec(),
            last_week_files: uploads.last_weekday_for(source_id).to_vec(),
            profile: profiles.parse(source_id)?,
        });
    }
    Ok(cases)
}

/// One row of the evaluation results table
///
/// Severities are shown after the absent-means-`AllGood` convention has
/// been applied, so the row matches the cell it was tallied into.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseRow {
    /// Source that was scored
    pub source_id: SourceId,

    /// Labeled severity
    pub actual: Severity,

    /// Predicted severity
    pub predicted: Severity,

    /// Where the source landed in the confusion matrix
    pub cell: ConfusionCell,
}

/// Everything one scored evaluation run produced
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationRun {
    /// Date that was evaluated
    pub date: NaiveDate,

    /// Severity class the run was scored against
    pub target: Severity,

    /// Per-source results, in source-id order
    pub rows: Vec<CaseRow>,

    /// Sources excluded from scoring because classification failed
    pub failures: Vec<SourceFailure>,

    /// The record this run contributes to the audit trail
    pub snapshot: MetricSnapshot,
}

impl EvaluationRun {
    /// Confusion tallies for the run
    pub fn counts(&self) -> &ConfusionCounts {
        &self.snapshot.counts
    }

    /// Derived quality scores for the run
    pub fn scores(&self) -> &Scores {
        &self.snapshot.scores
    }

    /// Number of sources that entered the tallies
    pub fn scored(&self) -> u64 {
        self.snapshot.scored()
    }

    /// Number of sources dispatched: scored plus unscored
    pub fn total(&self) -> u64 {
        self.snapshot.scored() + self.snapshot.unscored
    }
}

/// Orchestrates one evaluation run end to end
///
/// Construction fixes the knobs: data directory, dispatcher, the ruleset
/// version being judged, the target class, and the scope. After that,
/// [`run`](Self::run) is one labeled date in, one scored [`EvaluationRun`]
/// out.
pub struct EvalHarness {
    data_dir: PathBuf,
    dispatcher: Dispatcher,
    ruleset_version: String,
    target: Severity,
    limit: Option<usize>,
    all_sources: bool,
}

impl EvalHarness {
    /// Create a harness scoring `Urgent` over the labeled sources
    pub fn new(
        data_dir: impl Into<PathBuf>,
        dispatcher: Dispatcher,
        ruleset_version: impl Into<String>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            dispatcher,
            ruleset_version: ruleset_version.into(),
            target: Severity::Urgent,
            limit: None,
            all_sources: false,
        }
    }

    /// Score against a different target class
    pub fn with_target(mut self, target: Severity) -> Self {
        self.target = target;
        self
    }

    /// Classify at most `limit` sources (the first in id order)
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Classify every source in the upload log, not only the labeled ones
    pub fn with_all_sources(mut self) -> Self {
        self.all_sources = true;
        self
    }

    /// Run one evaluation: classify the scoped sources and score the result
    pub async fn run(&self, date: NaiveDate) -> Result<EvaluationRun, EvalError> {
        let truth = FeedbackStore::new(&self.data_dir).labeled_cases(date)?;
        let uploads = UploadIndex::load(&self.data_dir, date)?;
        let profiles = ProfileParser::new(&self.data_dir);

        let scope = self.scope(&truth, &uploads);
        info!(
            date = %date,
            labeled = truth.len(),
            scoped = scope.len(),
            version = %self.ruleset_version,
            "starting evaluation run"
        );

        let cases = build_cases(date, &uploads, &profiles, &scope)?;
        let outcome = self.dispatcher.run(cases).await;

        Ok(self.score(date, &truth, outcome))
    }

    /// Run one evaluation and append its snapshot to the audit trail
    pub async fn run_and_record(
        &self,
        date: NaiveDate,
        tracker: &mut IterationTracker,
    ) -> Result<EvaluationRun, EvalError> {
        let run = self.run(date).await?;
        tracker.record(run.snapshot.clone())?;
        Ok(run)
    }

    /// Sources the run will classify
    ///
    /// Defaults to the labeled sources: scoring needs ground truth, and
    /// classifying sources nobody labeled only adds unlabeled noise to an
    /// evaluation. With `all_sources` the whole upload log joins the scope,
    /// which is what a daily report wants. The limit truncates in id order
    /// either way.
    fn scope(&self, truth: &GroundTruth, uploads: &UploadIndex) -> Vec<SourceId> {
        let mut scope: Vec<SourceId> = if self.all_sources {
            let mut union: Vec<SourceId> =
                uploads.sources().chain(truth.sources()).cloned().collect();
            union.sort();
            union.dedup();
            union
        } else {
            truth.sources().cloned().collect()
        };

        if let Some(limit) = self.limit {
            scope.truncate(limit);
        }
        scope
    }

    /// Fold a classification outcome into a scored run
    ///
    /// Scoring covers exactly the sources the dispatcher produced a
    /// prediction for. A failed source contributes no cell: it is listed
    /// as unscored, never coerced to a severity. A labeled source outside
    /// the dispatched scope is not scored at all.
    fn score(
        &self,
        date: NaiveDate,
        truth: &GroundTruth,
        outcome: ClassificationOutcome,
    ) -> EvaluationRun {
        let mut scorable = GroundTruth::new(date);
        for (source_id, severity) in truth.iter() {
            if outcome.predictions.get(source_id).is_some() {
                scorable.insert(source_id.clone(), severity);
            }
        }

        let mut counts = ConfusionCounts::new();
        let mut rows = Vec::new();
        for (source_id, actual, predicted) in case_union(&scorable, &outcome.predictions) {
            let cell = classify_case(actual, predicted, self.target);
            counts.record(cell);
            rows.push(CaseRow {
                source_id: source_id.clone(),
                actual: actual.unwrap_or(Severity::AllGood),
                predicted: predicted.unwrap_or(Severity::AllGood),
                cell,
            });
        }

        if !outcome.failures.is_empty() {
            warn!(
                failed = outcome.failures.len(),
                "unclassified sources excluded from scoring"
            );
        }

        let snapshot = MetricSnapshot::new(
            self.ruleset_version.clone(),
            counts,
            outcome.failures.len() as u64,
        );

        EvaluationRun {
            date,
            target: self.target,
            rows,
            failures: outcome.failures,
            snapshot,
        }
    }
}
