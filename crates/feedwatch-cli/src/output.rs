//! Output formatting for the CLI.

use chrono::{DateTime, NaiveDate};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

use feedwatch_agent::SourceFailure;
use feedwatch_domain::{MetricSnapshot, Severity, SourceReport};
use feedwatch_eval::{EvaluationRun, MetricDelta};

use crate::config::OutputFormat;
use crate::error::Result;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format one day's incident report.
    pub fn format_daily_report(
        &self,
        date: NaiveDate,
        reports: &[SourceReport],
        failures: &[SourceFailure],
    ) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "date": date,
                "sources": reports,
                "failures": failures,
            }))?),
            OutputFormat::Table => Ok(self.format_report_table(date, reports, failures)),
            OutputFormat::Quiet => {
                let ids: Vec<&str> = reports
                    .iter()
                    .filter(|report| report.status != Severity::AllGood)
                    .map(|report| report.source_id.as_str())
                    .collect();
                Ok(ids.join("\n"))
            }
        }
    }

    /// Format a scored evaluation run.
    pub fn format_evaluation(&self, run: &EvaluationRun) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(run)?),
            OutputFormat::Table => Ok(self.format_evaluation_table(run)),
            OutputFormat::Quiet => Ok(run.snapshot.id.to_string()),
        }
    }

    /// Format the recorded tuning history.
    pub fn format_history(&self, snapshots: &[MetricSnapshot]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(snapshots)?),
            OutputFormat::Table => Ok(self.format_history_table(snapshots)),
            OutputFormat::Quiet => {
                let ids: Vec<String> = snapshots.iter().map(|s| s.id.to_string()).collect();
                Ok(ids.join("\n"))
            }
        }
    }

    /// Format a version-to-version score comparison.
    pub fn format_delta(&self, delta: &MetricDelta) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(delta)?),
            OutputFormat::Table => Ok(self.format_delta_table(delta)),
            OutputFormat::Quiet => Ok(format!(
                "{} {} {}",
                delta_value(delta.precision_delta),
                delta_value(delta.recall_delta),
                delta_value(delta.f1_delta)
            )),
        }
    }

    fn format_report_table(
        &self,
        date: NaiveDate,
        reports: &[SourceReport],
        failures: &[SourceFailure],
    ) -> String {
        let mut output = format!("Daily Ingestion Report - {}\n\n", date);

        if reports.is_empty() {
            output.push_str(&self.colorize("No sources analyzed.", "yellow"));
            output.push('\n');
        } else {
            // Most critical sources first; ties stay in source-id order.
            let mut ordered: Vec<&SourceReport> = reports.iter().collect();
            ordered.sort_by_key(|report| std::cmp::Reverse(report.status));

            let mut builder = Builder::default();
            builder.push_record(["Status", "Source ID", "Severity", "Incidents"]);
            for report in &ordered {
                builder.push_record(vec![
                    glyph(report.status).to_string(),
                    report.source_id.to_string(),
                    report.status.to_string(),
                    report.incidents.len().to_string(),
                ]);
            }
            let mut table = builder.build();
            table
                .with(Style::rounded())
                .with(Modify::new(Rows::first()).with(Alignment::center()));
            output.push_str(&table.to_string());
            output.push('\n');

            let flagged: Vec<&&SourceReport> = ordered
                .iter()
                .filter(|report| report.status != Severity::AllGood)
                .collect();
            let urgent = ordered
                .iter()
                .filter(|report| report.status == Severity::Urgent)
                .count();
            output.push_str(&format!(
                "\n{} of {} source(s) flagged ({} urgent)\n",
                flagged.len(),
                reports.len(),
                urgent
            ));

            for report in flagged {
                output.push('\n');
                output.push_str(&format!(
                    "{} Source {}\n",
                    glyph(report.status),
                    report.source_id
                ));

                if !report.incidents.is_empty() {
                    let mut builder = Builder::default();
                    builder.push_record(["Severity", "Type", "File", "Description"]);
                    for incident in &report.incidents {
                        builder.push_record(vec![
                            incident.severity.to_string(),
                            incident.kind.to_string(),
                            incident.file_name.clone().unwrap_or_else(|| "-".to_string()),
                            incident.description.clone(),
                        ]);
                    }
                    let mut table = builder.build();
                    table
                        .with(Style::rounded())
                        .with(Modify::new(Rows::first()).with(Alignment::center()));
                    output.push_str(&table.to_string());
                    output.push('\n');
                }

                if !report.recommendations.is_empty() {
                    output.push_str("Recommendations:\n");
                    for recommendation in &report.recommendations {
                        output.push_str(&format!("  • {}\n", recommendation));
                    }
                }
            }
        }

        if !failures.is_empty() {
            output.push('\n');
            output.push_str(&self.warning(&format!(
                "{} source(s) could not be analyzed:",
                failures.len()
            )));
            output.push('\n');
            for failure in failures {
                output.push_str(&format!("  - {}: {}\n", failure.source_id, failure.error));
            }
        }

        output
    }

    fn format_evaluation_table(&self, run: &EvaluationRun) -> String {
        let mut output = format!(
            "Evaluation for {} - target {}, ruleset '{}'\n\n",
            run.date, run.target, run.snapshot.ruleset_version
        );

        if run.rows.is_empty() {
            output.push_str(&self.colorize("No sources scored.", "yellow"));
            output.push('\n');
        } else {
            let mut builder = Builder::default();
            builder.push_record(["Source ID", "Actual", "Predicted", "Result"]);
            for row in &run.rows {
                builder.push_record(vec![
                    row.source_id.to_string(),
                    row.actual.to_string(),
                    row.predicted.to_string(),
                    row.cell.to_string(),
                ]);
            }
            let mut table = builder.build();
            table
                .with(Style::rounded())
                .with(Modify::new(Rows::first()).with(Alignment::center()));
            output.push_str(&table.to_string());
            output.push('\n');
        }

        let counts = run.counts();
        output.push_str(&format!(
            "\nTP: {}  FP: {}  FN: {}  TN: {}\n",
            counts.true_positives,
            counts.false_positives,
            counts.false_negatives,
            counts.true_negatives
        ));

        let scores = run.scores();
        output.push_str(&format!(
            "Precision: {}  Recall: {}  F1: {}\n",
            metric(scores.precision),
            metric(scores.recall),
            metric(scores.f1)
        ));
        output.push_str(&format!(
            "Scored {} source(s), {} unscored, {} total\n",
            run.scored(),
            run.snapshot.unscored,
            run.total()
        ));

        if !run.failures.is_empty() {
            output.push_str("\nUnscored sources:\n");
            for failure in &run.failures {
                output.push_str(&format!("  - {}: {}\n", failure.source_id, failure.error));
            }
        }

        output.push('\n');
        output.push_str(&self.success(&format!(
            "Snapshot {} recorded under ruleset '{}'",
            run.snapshot.id, run.snapshot.ruleset_version
        )));

        output
    }

    fn format_history_table(&self, snapshots: &[MetricSnapshot]) -> String {
        if snapshots.is_empty() {
            return self.colorize("No snapshots recorded.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record([
            "Recorded (UTC)",
            "Ruleset",
            "Precision",
            "Recall",
            "F1",
            "Scored",
            "Unscored",
        ]);
        for snapshot in snapshots {
            builder.push_record(vec![
                recorded_at(snapshot),
                snapshot.ruleset_version.clone(),
                metric(snapshot.scores.precision),
                metric(snapshot.scores.recall),
                metric(snapshot.scores.f1),
                snapshot.scored().to_string(),
                snapshot.unscored.to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    fn format_delta_table(&self, delta: &MetricDelta) -> String {
        let mut output = format!(
            "{} -> {}\n\n",
            delta.baseline_version, delta.candidate_version
        );

        let mut builder = Builder::default();
        builder.push_record([
            "Metric",
            delta.baseline_version.as_str(),
            delta.candidate_version.as_str(),
            "Delta",
        ]);
        builder.push_record(vec![
            "Precision".to_string(),
            metric(delta.baseline.precision),
            metric(delta.candidate.precision),
            delta_value(delta.precision_delta),
        ]);
        builder.push_record(vec![
            "Recall".to_string(),
            metric(delta.baseline.recall),
            metric(delta.candidate.recall),
            delta_value(delta.recall_delta),
        ]);
        builder.push_record(vec![
            "F1".to_string(),
            metric(delta.baseline.f1),
            metric(delta.candidate.f1),
            delta_value(delta.f1_delta),
        ]);

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        output.push_str(&table.to_string());
        output
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Status glyph for a severity.
fn glyph(severity: Severity) -> &'static str {
    match severity {
        Severity::Urgent => "🔴",
        Severity::AttentionRequired => "🟡",
        Severity::AllGood => "🟢",
    }
}

/// A metric value for display, "n/a" when undefined.
fn metric(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

/// A signed metric delta for display, "n/a" when undefined.
fn delta_value(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:+.2}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Snapshot timestamp as a UTC datetime string.
fn recorded_at(snapshot: &MetricSnapshot) -> String {
    DateTime::from_timestamp(snapshot.recorded_at as i64, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedwatch_domain::{
        ConfusionCell, ConfusionCounts, Incident, IncidentKind, Scores, SourceId,
    };
    use feedwatch_eval::CaseRow;

    fn test_run() -> EvaluationRun {
        let counts = ConfusionCounts {
            true_positives: 1,
            false_positives: 0,
            false_negatives: 1,
            true_negatives: 0,
        };
        EvaluationRun {
            date: "2025-09-10".parse().unwrap(),
            target: Severity::Urgent,
            rows: vec![
                CaseRow {
                    source_id: SourceId::new("195385"),
                    actual: Severity::Urgent,
                    predicted: Severity::AttentionRequired,
                    cell: ConfusionCell::FalseNegative,
                },
                CaseRow {
                    source_id: SourceId::new("220504"),
                    actual: Severity::Urgent,
                    predicted: Severity::Urgent,
                    cell: ConfusionCell::TruePositive,
                },
            ],
            failures: Vec::new(),
            snapshot: MetricSnapshot::new("v1-baseline", counts, 0),
        }
    }

    fn flagged_report() -> SourceReport {
        SourceReport {
            source_id: SourceId::new("220504"),
            incidents: vec![Incident {
                kind: IncidentKind::MissingFile,
                severity: Severity::Urgent,
                description: "no file arrived for the 15:00 slot".to_string(),
                file_name: None,
            }],
            status: Severity::Urgent,
            recommendations: vec!["Check the upstream export job".to_string()],
        }
    }

    #[test]
    fn test_evaluation_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_evaluation(&test_run()).unwrap();

        assert!(output.contains("target URGENT"));
        assert!(output.contains("195385"));
        assert!(output.contains("FN"));
        assert!(output.contains("TP: 1  FP: 0  FN: 1  TN: 0"));
        // Precision 1.00, recall 0.50, F1 from both.
        assert!(output.contains("Precision: 1.00"));
        assert!(output.contains("Recall: 0.50"));
    }

    #[test]
    fn test_evaluation_undefined_metrics_say_na() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let mut run = test_run();
        run.snapshot = MetricSnapshot::new("v1-baseline", ConfusionCounts::new(), 0);
        run.rows.clear();

        let output = formatter.format_evaluation(&run).unwrap();
        assert!(output.contains("Precision: n/a"));
        assert!(output.contains("F1: n/a"));
    }

    #[test]
    fn test_evaluation_json_format() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_evaluation(&test_run()).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["target"], "URGENT");
        assert_eq!(parsed["rows"][0]["cell"], "FalseNegative");
        // Undefined metrics serialize as null, never 0.0.
        assert_eq!(parsed["snapshot"]["scores"]["precision"], 1.0);
    }

    #[test]
    fn test_evaluation_quiet_is_snapshot_id() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let run = test_run();
        let output = formatter.format_evaluation(&run).unwrap();

        assert_eq!(output, run.snapshot.id.to_string());
    }

    #[test]
    fn test_daily_report_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let reports = vec![flagged_report()];
        let failures = vec![SourceFailure {
            source_id: SourceId::new("195385"),
            error: "Communication error: connection reset".to_string(),
        }];

        let output = formatter
            .format_daily_report("2025-09-10".parse().unwrap(), &reports, &failures)
            .unwrap();

        assert!(output.contains("Daily Ingestion Report - 2025-09-10"));
        assert!(output.contains("🔴"));
        assert!(output.contains("Missing File"));
        assert!(output.contains("Check the upstream export job"));
        assert!(output.contains("1 source(s) could not be analyzed"));
        assert!(output.contains("195385: Communication error"));
    }

    #[test]
    fn test_daily_report_quiet_lists_flagged_only() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let reports = vec![
            SourceReport::all_good(SourceId::new("111111")),
            flagged_report(),
        ];

        let output = formatter
            .format_daily_report("2025-09-10".parse().unwrap(), &reports, &[])
            .unwrap();

        assert_eq!(output, "220504");
    }

    #[test]
    fn test_history_empty_message() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_history(&[]).unwrap();
        assert!(output.contains("No snapshots recorded"));
    }

    #[test]
    fn test_history_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let counts = ConfusionCounts {
            true_positives: 4,
            false_positives: 0,
            false_negatives: 1,
            true_negatives: 0,
        };
        let snapshots = vec![MetricSnapshot::new("v1-baseline", counts, 1)];

        let output = formatter.format_history(&snapshots).unwrap();
        assert!(output.contains("v1-baseline"));
        assert!(output.contains("0.80"));
        assert!(output.contains("Unscored"));
    }

    #[test]
    fn test_delta_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let delta = MetricDelta {
            baseline_version: "v1-baseline".to_string(),
            candidate_version: "v2-volume-drop".to_string(),
            baseline: Scores {
                precision: Some(1.0),
                recall: Some(0.8),
                f1: Some(8.0 / 9.0),
            },
            candidate: Scores {
                precision: Some(1.0),
                recall: Some(1.0),
                f1: Some(1.0),
            },
            precision_delta: Some(0.0),
            recall_delta: Some(0.2),
            f1_delta: Some(1.0 / 9.0),
        };

        let output = formatter.format_delta(&delta).unwrap();
        assert!(output.contains("v1-baseline -> v2-volume-drop"));
        assert!(output.contains("+0.20"));
        assert!(output.contains("+0.11"));
    }

    #[test]
    fn test_delta_undefined_side_says_na() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let delta = MetricDelta {
            baseline_version: "v1-baseline".to_string(),
            candidate_version: "v2-volume-drop".to_string(),
            baseline: Scores {
                precision: None,
                recall: Some(0.0),
                f1: None,
            },
            candidate: Scores {
                precision: Some(1.0),
                recall: Some(1.0),
                f1: Some(1.0),
            },
            precision_delta: None,
            recall_delta: Some(1.0),
            f1_delta: None,
        };

        let output = formatter.format_delta(&delta).unwrap();
        assert!(output.contains("n/a"));
        assert!(output.contains("+1.00"));
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let msg = formatter.success("test");
        assert_eq!(msg, "✓ test");
    }
}
