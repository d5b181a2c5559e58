//! Report command implementation.

use std::path::Path;
use std::sync::Arc;

use feedwatch_agent::{Dispatcher, GeminiAgent, Ruleset};
use feedwatch_eval::build_cases;
use feedwatch_ingest::{ProfileParser, UploadIndex};

use crate::cli::ReportArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the report command.
///
/// Classifies every source in the day's upload log and prints the incident
/// report. No scoring happens here; ground-truth labels are not even loaded.
pub async fn execute_report(
    args: ReportArgs,
    api_key: String,
    config: &Config,
    data_dir: &Path,
    formatter: &Formatter,
) -> Result<()> {
    let uploads = UploadIndex::load(data_dir, args.date)?;
    let profiles = ProfileParser::new(data_dir);

    let mut sources: Vec<_> = uploads.sources().cloned().collect();
    if let Some(limit) = args.limit {
        sources.truncate(limit);
    }

    let cases = build_cases(args.date, &uploads, &profiles, &sources)?;

    let agent = GeminiAgent::with_config(api_key, Ruleset::baseline(), &config.agent);
    let dispatcher = Dispatcher::with_config(Arc::new(agent), &config.agent);
    let outcome = dispatcher.run(cases).await;

    println!(
        "{}",
        formatter.format_daily_report(args.date, &outcome.reports, &outcome.failures)?
    );

    Ok(())
}
