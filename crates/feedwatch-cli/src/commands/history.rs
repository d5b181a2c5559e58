//! History command implementation.

use std::path::Path;

use feedwatch_eval::IterationTracker;

use crate::error::Result;
use crate::output::Formatter;

/// Execute the history command.
pub async fn execute_history(data_dir: &Path, formatter: &Formatter) -> Result<()> {
    let tracker = IterationTracker::open(data_dir)?;
    println!("{}", formatter.format_history(tracker.history())?);
    Ok(())
}
