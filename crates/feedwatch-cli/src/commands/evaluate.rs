//! Evaluate command implementation.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use feedwatch_agent::{Dispatcher, GeminiAgent, Ruleset};
use feedwatch_eval::{EvalHarness, IterationTracker};

use crate::cli::EvaluateArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;

/// Execute the evaluate command.
///
/// Scores one labeled day under a ruleset and appends the resulting
/// snapshot to the tuning history. The run itself succeeding is what exit
/// status reflects; zero counts or undefined metrics are valid outcomes.
pub async fn execute_evaluate(
    args: EvaluateArgs,
    api_key: String,
    config: &Config,
    data_dir: &Path,
    formatter: &Formatter,
) -> Result<()> {
    let ruleset = match &args.ruleset {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Ruleset::from_toml(&text).map_err(CliError::InvalidInput)?
        }
        None => Ruleset::baseline(),
    };
    let version = ruleset.version.clone();

    let agent = GeminiAgent::with_config(api_key, ruleset, &config.agent);
    let dispatcher = Dispatcher::with_config(Arc::new(agent), &config.agent);

    let mut harness = EvalHarness::new(data_dir, dispatcher, version);
    if let Some(limit) = args.limit {
        harness = harness.with_limit(limit);
    }
    if args.all_sources {
        harness = harness.with_all_sources();
    }

    let mut tracker = IterationTracker::open(data_dir)?;
    let run = harness.run_and_record(args.date, &mut tracker).await?;

    println!("{}", formatter.format_evaluation(&run)?);

    Ok(())
}
