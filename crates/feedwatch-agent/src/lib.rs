//! Feedwatch Agent Layer
//!
//! The classifier adapter: everything between an assembled [`SourceCase`]
//! and a [`SourceReport`](feedwatch_domain::SourceReport). The classifier
//! itself is a black box behind the [`SourceAnalyzer`] trait; this crate
//! ships two implementations and the machinery around them.
//!
//! # Analyzers
//!
//! - [`MockAnalyzer`]: deterministic scripted analyzer for testing
//! - [`GeminiAgent`]: Gemini API integration with bounded retry
//!
//! # Machinery
//!
//! - [`prompt`]: versioned rulesets and prompt assembly
//! - [`parser`]: strict-status, tolerant-incident response parsing
//! - [`dispatch`]: bounded-concurrency fan-out over many sources
//! - [`config`]: tunable knobs with validation and TOML round-trip
//!
//! A failed analysis is an error, never a severity. Whoever calls the
//! dispatcher decides what to do with failed sources; nothing in this crate
//! invents a label for them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dispatch;
pub mod gemini;
pub mod parser;
pub mod prompt;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use feedwatch_domain::{FileRecord, Severity, SourceId, SourceProfile, SourceReport};

pub use config::AgentConfig;
pub use dispatch::{ClassificationOutcome, Dispatcher, SourceFailure};
pub use gemini::GeminiAgent;
pub use prompt::{PromptBuilder, Ruleset};

/// Errors that can occur while classifying a source
#[derive(Error, Debug)]
pub enum AgentError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Provider quota exhausted and retries did not recover
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The classifier answered with something unusable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The configured model does not exist on the provider
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),
}

/// Everything the classifier gets to see about one source on one day
///
/// Assembled by the caller from the upload log and the profile store, and
/// passed through opaquely. Ground-truth labels are deliberately not part
/// of the case: the classifier must never see them.
#[derive(Debug, Clone)]
pub struct SourceCase {
    /// Source under analysis
    pub source_id: SourceId,

    /// Evaluation date
    pub date: NaiveDate,

    /// Today's uploads for the source
    pub files: Vec<FileRecord>,

    /// Uploads from the same weekday one week back, as a baseline
    pub last_week_files: Vec<FileRecord>,

    /// Historical upload profile, when one exists
    pub profile: Option<SourceProfile>,
}

/// The classifier seam
///
/// One method, one source at a time. Implementations must be safe to call
/// concurrently for distinct sources: the dispatcher fans cases out over
/// shared references with no external locking.
#[async_trait]
pub trait SourceAnalyzer: Send + Sync {
    /// Classify one source, producing its report for the day
    async fn analyze(&self, case: &SourceCase) -> Result<SourceReport, AgentError>;
}

enum ScriptedOutcome {
    Report(SourceReport),
    Failure(String),
}

/// Deterministic analyzer for testing
///
/// Returns pre-scripted reports or failures per source without any network
/// traffic, and records how it was called: total call count and the highest
/// number of concurrently in-flight calls, which lets tests pin dispatcher
/// behavior down.
///
/// # Examples
///
/// ```
/// use feedwatch_agent::{MockAnalyzer, SourceAnalyzer, SourceCase};
/// use feedwatch_domain::{Severity, SourceId};
///
/// # tokio_test::block_on(async {
/// let mut analyzer = MockAnalyzer::new(Severity::AllGood);
/// analyzer.add_status(SourceId::new("220504"), Severity::Urgent);
///
/// let case = SourceCase {
///     source_id: SourceId::new("220504"),
///     date: "2025-09-10".parse().unwrap(),
///     files: Vec::new(),
///     last_week_files: Vec::new(),
///     profile: None,
/// };
/// let report = analyzer.analyze(&case).await.unwrap();
/// assert_eq!(report.status, Severity::Urgent);
/// assert_eq!(analyzer.call_count(), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct MockAnalyzer {
    default_status: Severity,
    outcomes: Arc<Mutex<HashMap<SourceId, ScriptedOutcome>>>,
    delay: Option<Duration>,
    call_count: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockAnalyzer {
    /// Create an analyzer that answers `default_status` for unscripted sources
    pub fn new(default_status: Severity) -> Self {
        Self {
            default_status,
            outcomes: Arc::new(Mutex::new(HashMap::new())),
            delay: None,
            call_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Script a full report for a source
    pub fn add_report(&mut self, source_id: SourceId, report: SourceReport) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(source_id, ScriptedOutcome::Report(report));
    }

    /// Script a bare status for a source (no incidents, no recommendations)
    pub fn add_status(&mut self, source_id: SourceId, status: Severity) {
        let report = SourceReport {
            source_id: source_id.clone(),
            incidents: Vec::new(),
            status,
            recommendations: Vec::new(),
        };
        self.add_report(source_id, report);
    }

    /// Script a classification failure for a source
    pub fn add_failure(&mut self, source_id: SourceId, message: impl Into<String>) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(source_id, ScriptedOutcome::Failure(message.into()));
    }

    /// Hold each call open for `delay`, making concurrency observable
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `analyze` was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Highest number of calls that were in flight at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAnalyzer for MockAnalyzer {
    async fn analyze(&self, case: &SourceCase) -> Result<SourceReport, AgentError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = match self.outcomes.lock().unwrap().get(&case.source_id) {
            Some(ScriptedOutcome::Report(report)) => Ok(report.clone()),
            Some(ScriptedOutcome::Failure(message)) => {
                Err(AgentError::Communication(message.clone()))
            }
            None => Ok(SourceReport {
                source_id: case.source_id.clone(),
                incidents: Vec::new(),
                status: self.default_status,
                recommendations: Vec::new(),
            }),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str) -> SourceCase {
        SourceCase {
            source_id: SourceId::new(id),
            date: "2025-09-10".parse().unwrap(),
            files: Vec::new(),
            last_week_files: Vec::new(),
            profile: None,
        }
    }

    #[tokio::test]
    async fn test_mock_default_status() {
        let analyzer = MockAnalyzer::new(Severity::AllGood);

        let report = analyzer.analyze(&case("anything")).await.unwrap();
        assert_eq!(report.status, Severity::AllGood);
        assert!(report.incidents.is_empty());
    }

    #[tokio::test]
    async fn test_mock_scripted_outcomes() {
        let mut analyzer = MockAnalyzer::new(Severity::AllGood);
        analyzer.add_status(SourceId::new("220504"), Severity::Urgent);
        analyzer.add_failure(SourceId::new("195385"), "connection reset");

        let urgent = analyzer.analyze(&case("220504")).await.unwrap();
        assert_eq!(urgent.status, Severity::Urgent);

        let failed = analyzer.analyze(&case("195385")).await;
        assert!(matches!(failed, Err(AgentError::Communication(_))));

        assert_eq!(analyzer.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_clone_shares_counters() {
        let analyzer = MockAnalyzer::new(Severity::AllGood);
        let clone = analyzer.clone();

        clone.analyze(&case("1")).await.unwrap();

        assert_eq!(analyzer.call_count(), 1);
        assert_eq!(clone.call_count(), 1);
    }
}
