//! CLI command definitions and argument parsing.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Feedwatch CLI - Monitor data-source uploads and tune the incident classifier.
#[derive(Debug, Parser)]
#[command(name = "feedwatch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Data directory holding upload logs, profiles, and feedback
    #[arg(long, global = true)]
    pub data_dir: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (ids only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify one day's sources and print the incident report
    Report(ReportArgs),

    /// Score the classifier against operator feedback for one day
    Evaluate(EvaluateArgs),

    /// Show the recorded tuning history
    History,

    /// Compare scores between two ruleset versions
    Compare(CompareArgs),
}

/// Arguments for the report command.
#[derive(Debug, Parser)]
pub struct ReportArgs {
    /// Day to report on (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Analyze at most this many sources (first in id order)
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the evaluate command.
#[derive(Debug, Parser)]
pub struct EvaluateArgs {
    /// Day to evaluate (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,

    /// Classify at most this many sources (first in id order)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Classify every source in the upload log, not only the labeled ones
    #[arg(long)]
    pub all_sources: bool,

    /// TOML ruleset file to evaluate (defaults to the built-in baseline)
    #[arg(short, long)]
    pub ruleset: Option<String>,
}

/// Arguments for the compare command.
#[derive(Debug, Parser)]
pub struct CompareArgs {
    /// Ruleset version the comparison starts from
    pub baseline: String,

    /// Ruleset version being judged against the baseline
    pub candidate: String,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
