//! Compare command implementation.

use std::path::Path;

use feedwatch_eval::IterationTracker;

use crate::cli::CompareArgs;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the compare command.
///
/// Compares the latest recorded snapshot of each named ruleset version.
pub async fn execute_compare(
    args: CompareArgs,
    data_dir: &Path,
    formatter: &Formatter,
) -> Result<()> {
    let tracker = IterationTracker::open(data_dir)?;
    let delta = tracker.delta(&args.baseline, &args.candidate)?;
    println!("{}", formatter.format_delta(&delta)?);
    Ok(())
}
