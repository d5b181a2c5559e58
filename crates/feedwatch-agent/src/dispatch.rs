//! Concurrent classification dispatch
//!
//! Fans a batch of source cases out over an analyzer with a bounded number
//! of in-flight calls, waits for every call to finish, and only then hands
//! back the materialized results. Evaluation downstream never sees a
//! partial batch: a source either produced a prediction or is listed as a
//! failure, and the two lists together cover the whole batch.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use feedwatch_domain::{PredictionSet, SourceId, SourceReport};

use crate::config::AgentConfig;
use crate::{AgentError, SourceAnalyzer, SourceCase};

/// Default cap on concurrently in-flight classification calls
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// One source whose classification definitively failed
///
/// Failed sources are excluded from confusion counts and reported
/// separately; the error text is kept for the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    /// Source that could not be classified
    pub source_id: SourceId,
    /// Why, as rendered for the report
    pub error: String,
}

/// Everything one dispatched batch produced
#[derive(Debug)]
pub struct ClassificationOutcome {
    /// Predicted severity per successfully classified source
    pub predictions: PredictionSet,

    /// Full reports, in source-id order
    pub reports: Vec<SourceReport>,

    /// Sources that failed after retries, in source-id order
    pub failures: Vec<SourceFailure>,
}

/// Bounded-concurrency fan-out over a source analyzer
pub struct Dispatcher {
    analyzer: Arc<dyn SourceAnalyzer>,
    max_concurrency: usize,
    stagger: Option<Duration>,
}

impl Dispatcher {
    /// Create a dispatcher with default limits
    pub fn new(analyzer: Arc<dyn SourceAnalyzer>) -> Self {
        Self {
            analyzer,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            stagger: None,
        }
    }

    /// Create a dispatcher with limits taken from a configuration
    pub fn with_config(analyzer: Arc<dyn SourceAnalyzer>, config: &AgentConfig) -> Self {
        Self {
            analyzer,
            max_concurrency: config.max_concurrency.max(1),
            stagger: config.stagger(),
        }
    }

    /// Cap the number of concurrently in-flight calls (minimum 1)
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Pause between task launches, spacing requests against quotas
    pub fn with_stagger(mut self, delay: Duration) -> Self {
        self.stagger = Some(delay);
        self
    }

    /// Classify a batch of cases and wait for all of them
    ///
    /// Per-source failures land in the outcome's failure list; they never
    /// abort the batch. Completion order does not affect the outcome: the
    /// prediction set is a map and the report/failure lists are sorted by
    /// source id.
    pub async fn run(&self, cases: Vec<SourceCase>) -> ClassificationOutcome {
        let total = cases.len();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(total);

        for (launched, case) in cases.into_iter().enumerate() {
            if let Some(delay) = self.stagger {
                if launched > 0 {
                    tokio::time::sleep(delay).await;
                }
            }

            let analyzer = Arc::clone(&self.analyzer);
            let semaphore = Arc::clone(&semaphore);
            let source_id = case.source_id.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            case.source_id,
                            Err(AgentError::Communication(
                                "dispatcher shut down".to_string(),
                            )),
                        )
                    }
                };
                let result = analyzer.analyze(&case).await;
                (case.source_id, result)
            });

            handles.push((source_id, handle));
        }

        let mut reports: Vec<SourceReport> = Vec::new();
        let mut failures: Vec<SourceFailure> = Vec::new();

        for (source_id, handle) in handles {
            match handle.await {
                Ok((id, Ok(report))) => {
                    debug!(source = %id, status = %report.status, "source classified");
                    reports.push(report);
                }
                Ok((id, Err(e))) => {
                    warn!(source = %id, error = %e, "source classification failed");
                    failures.push(SourceFailure {
                        source_id: id,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    error!(source = %source_id, error = %e, "classification task panicked");
                    failures.push(SourceFailure {
                        source_id,
                        error: format!("classification task panicked: {}", e),
                    });
                }
            }
        }

        reports.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        failures.sort_by(|a, b| a.source_id.cmp(&b.source_id));

        let predictions: PredictionSet = reports
            .iter()
            .map(|report| (report.source_id.clone(), report.status))
            .collect();

        debug!(
            total,
            classified = reports.len(),
            failed = failures.len(),
            "classification batch complete"
        );

        ClassificationOutcome {
            predictions,
            reports,
            failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockAnalyzer;
    use feedwatch_domain::Severity;

    fn case(id: &str) -> SourceCase {
        SourceCase {
            source_id: SourceId::new(id),
            date: "2025-09-10".parse().unwrap(),
            files: Vec::new(),
            last_week_files: Vec::new(),
            profile: None,
        }
    }

    fn cases(ids: &[&str]) -> Vec<SourceCase> {
        ids.iter().map(|id| case(id)).collect()
    }

    fn scripted_analyzer() -> MockAnalyzer {
        let mut analyzer = MockAnalyzer::new(Severity::AllGood);
        analyzer.add_status(SourceId::new("220504"), Severity::Urgent);
        analyzer.add_status(SourceId::new("220505"), Severity::AttentionRequired);
        analyzer.add_status(SourceId::new("195385"), Severity::Urgent);
        analyzer
    }

    #[tokio::test]
    async fn test_concurrent_equals_sequential() {
        let batch = &["220504", "220505", "195385", "196125", "220506"];

        let parallel = Dispatcher::new(Arc::new(scripted_analyzer()))
            .with_max_concurrency(8)
            .run(cases(batch))
            .await;

        let sequential = Dispatcher::new(Arc::new(scripted_analyzer()))
            .with_max_concurrency(1)
            .run(cases(batch))
            .await;

        assert_eq!(parallel.predictions, sequential.predictions);
        assert_eq!(parallel.reports, sequential.reports);
    }

    #[tokio::test]
    async fn test_concurrency_cap_is_honored() {
        let analyzer =
            MockAnalyzer::new(Severity::AllGood).with_delay(Duration::from_millis(20));
        let dispatcher = Dispatcher::new(Arc::new(analyzer.clone())).with_max_concurrency(2);

        let outcome = dispatcher
            .run(cases(&["1", "2", "3", "4", "5", "6", "7", "8"]))
            .await;

        assert_eq!(outcome.predictions.len(), 8);
        assert!(
            analyzer.max_in_flight() <= 2,
            "cap of 2 exceeded: {} calls were in flight",
            analyzer.max_in_flight()
        );
        assert_eq!(analyzer.call_count(), 8);
    }

    #[tokio::test]
    async fn test_failed_source_does_not_abort_batch() {
        let mut analyzer = scripted_analyzer();
        analyzer.add_failure(SourceId::new("220505"), "quota exhausted");

        let outcome = Dispatcher::new(Arc::new(analyzer))
            .run(cases(&["220504", "220505", "195385"]))
            .await;

        assert_eq!(outcome.predictions.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].source_id, SourceId::new("220505"));
        assert!(outcome.failures[0].error.contains("quota exhausted"));
        assert_eq!(
            outcome.predictions.get(&SourceId::new("220505")),
            None,
            "failed source must not receive a prediction"
        );
    }

    #[tokio::test]
    async fn test_every_case_is_accounted_for() {
        let mut analyzer = MockAnalyzer::new(Severity::AllGood);
        analyzer.add_failure(SourceId::new("2"), "boom");
        analyzer.add_failure(SourceId::new("4"), "boom");

        let batch = cases(&["1", "2", "3", "4", "5"]);
        let total = batch.len();

        let outcome = Dispatcher::new(Arc::new(analyzer)).run(batch).await;

        assert_eq!(outcome.predictions.len() + outcome.failures.len(), total);
    }

    #[tokio::test]
    async fn test_reports_sorted_regardless_of_input_order() {
        let outcome = Dispatcher::new(Arc::new(scripted_analyzer()))
            .run(cases(&["220505", "195385", "220504"]))
            .await;

        let ids: Vec<&str> = outcome
            .reports
            .iter()
            .map(|r| r.source_id.as_str())
            .collect();
        assert_eq!(ids, vec!["195385", "220504", "220505"]);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let outcome = Dispatcher::new(Arc::new(MockAnalyzer::new(Severity::AllGood)))
            .run(Vec::new())
            .await;

        assert!(outcome.predictions.is_empty());
        assert!(outcome.reports.is_empty());
        assert!(outcome.failures.is_empty());
    }
}
