//! Incident module - detected anomalies and per-source reports

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::severity::Severity;
use crate::source::SourceId;

/// Category of a detected ingestion anomaly
///
/// The wire strings are the human-readable names the detection rules are
/// written against, so they appear verbatim in reports and classifier output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentKind {
    /// No file arrived for a scheduled slot
    #[serde(rename = "Missing File")]
    MissingFile,

    /// The same file was uploaded more than once
    #[serde(rename = "Duplicated File")]
    DuplicatedFile,

    /// A file arrived with zero rows where rows were expected
    #[serde(rename = "Unexpected Empty File")]
    UnexpectedEmpty,

    /// Row count far outside the source's historical range
    #[serde(rename = "Unexpected Volume Variation")]
    VolumeVariation,

    /// Upload arrived well after the scheduled time
    #[serde(rename = "File Upload After Schedule")]
    LateUpload,

    /// The file's content date is older than the evaluation date
    #[serde(rename = "Upload of Previous File")]
    PreviousFile,

    /// The platform failed to process the file
    #[serde(rename = "Failed File")]
    FailedFile,
}

impl IncidentKind {
    /// Get the kind as its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentKind::MissingFile => "Missing File",
            IncidentKind::DuplicatedFile => "Duplicated File",
            IncidentKind::UnexpectedEmpty => "Unexpected Empty File",
            IncidentKind::VolumeVariation => "Unexpected Volume Variation",
            IncidentKind::LateUpload => "File Upload After Schedule",
            IncidentKind::PreviousFile => "Upload of Previous File",
            IncidentKind::FailedFile => "Failed File",
        }
    }
}

impl std::fmt::Display for IncidentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single detected incident on one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// What kind of anomaly this is
    #[serde(rename = "incident_type")]
    pub kind: IncidentKind,

    /// How critical this incident is on its own
    pub severity: Severity,

    /// Brief explanation of what was observed
    pub description: String,

    /// File involved, absent for missing-file incidents
    #[serde(default)]
    pub file_name: Option<String>,
}

/// Classification verdict for one source on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    /// The source this report covers
    pub source_id: SourceId,

    /// Incidents detected today
    #[serde(default)]
    pub incidents: Vec<Incident>,

    /// Overall severity for the source
    pub status: Severity,

    /// Suggested operator actions
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl SourceReport {
    /// Create an all-good report with no incidents
    pub fn all_good(source_id: SourceId) -> Self {
        Self {
            source_id,
            incidents: Vec::new(),
            status: Severity::AllGood,
            recommendations: Vec::new(),
        }
    }
}

/// All source reports for one evaluation date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    /// The date the reports cover
    pub date: NaiveDate,

    /// Per-source verdicts, in source-id order
    pub sources: Vec<SourceReport>,
}

impl DailyReport {
    /// Create an empty report for a date
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            sources: Vec::new(),
        }
    }

    /// Number of sources whose status is at least `severity`
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.sources.iter().filter(|s| s.status >= severity).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incident_kind_wire_names() {
        let json = serde_json::to_string(&IncidentKind::VolumeVariation).unwrap();
        assert_eq!(json, "\"Unexpected Volume Variation\"");

        let parsed: IncidentKind = serde_json::from_str("\"Missing File\"").unwrap();
        assert_eq!(parsed, IncidentKind::MissingFile);
    }

    #[test]
    fn test_incident_deserializes_from_classifier_shape() {
        let json = r#"{
            "incident_type": "Unexpected Empty File",
            "severity": "ATTENTION_REQUIRED",
            "description": "0 rows where mean is 5953"
        }"#;

        let incident: Incident = serde_json::from_str(json).unwrap();
        assert_eq!(incident.kind, IncidentKind::UnexpectedEmpty);
        assert_eq!(incident.severity, Severity::AttentionRequired);
        assert_eq!(incident.file_name, None);
    }

    #[test]
    fn test_daily_report_counts() {
        let mut report = DailyReport::new("2025-09-10".parse().unwrap());
        report
            .sources
            .push(SourceReport::all_good(SourceId::new("1")));
        report.sources.push(SourceReport {
            source_id: SourceId::new("2"),
            incidents: Vec::new(),
            status: Severity::Urgent,
            recommendations: Vec::new(),
        });

        assert_eq!(report.count_at_least(Severity::AttentionRequired), 1);
        assert_eq!(report.count_at_least(Severity::AllGood), 2);
    }
}
