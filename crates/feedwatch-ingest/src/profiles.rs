//! Source profile ("CV") parsing
//!
//! Each source has a markdown profile at
//! `Files/datasource_cvs/<source_id>_native.md` describing its historical
//! upload behavior: workspace, filename structure, per-day upload schedule,
//! and per-day row-count statistics. The documents are generated for humans,
//! so parsing is regex-based and tolerant: whatever cannot be extracted is
//! simply left empty.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use feedwatch_domain::{SourceId, SourceProfile, VolumeStats};

use crate::error::IngestError;

/// Parses markdown source profiles with pre-compiled patterns
pub struct ProfileParser {
    cv_dir: PathBuf,
    workspace: Regex,
    filename_pattern: Regex,
    schedule_row: Regex,
    stats_row: Regex,
    mean: Regex,
    min: Regex,
    max: Regex,
}

impl ProfileParser {
    /// Create a parser rooted at the data directory
    pub fn new(data_dir: &Path) -> Self {
        Self {
            cv_dir: data_dir.join("Files").join("datasource_cvs"),
            workspace: Regex::new(r"Workspace ID\*\*: (\d+)").unwrap(),
            filename_pattern: Regex::new(r"Common structure: `([^`]+)`").unwrap(),
            // Schedule table rows look like "| Mon | 15:00 | ... |".
            schedule_row: Regex::new(
                r"\|\s*(Mon|Tue|Wed|Thu|Fri|Sat|Sun)\s*\|\s*(\d{2}:\d{2})\s*\|",
            )
            .unwrap(),
            // Summary rows carry bullet stats in the second cell, e.g.
            // "| Mon | • Min: 1<br>• Max: 10,762<br>• Mean: 5,953.54 |".
            // Requiring a stat label keeps schedule rows out.
            stats_row: Regex::new(
                r"\|\s*(Mon|Tue|Wed|Thu|Fri|Sat|Sun)\s*\|\s*([^|]*(?:Mean|Min|Max): [^|]*)\|",
            )
            .unwrap(),
            mean: Regex::new(r"Mean: ([\d,.]+)").unwrap(),
            min: Regex::new(r"Min: ([\d,.]+)").unwrap(),
            max: Regex::new(r"Max: ([\d,.]+)").unwrap(),
        }
    }

    /// Parse the profile for a source, `None` when no profile document exists
    ///
    /// Sources without a profile are common (new feeds, decommissioned
    /// feeds); the caller decides whether to classify them without context
    /// or skip them.
    pub fn parse(&self, source_id: &SourceId) -> Result<Option<SourceProfile>, IngestError> {
        let path = self.cv_dir.join(format!("{}_native.md", source_id));
        if !path.exists() {
            debug!(source = %source_id, "no profile document");
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        Ok(Some(self.parse_content(source_id, &content)))
    }

    fn parse_content(&self, source_id: &SourceId, content: &str) -> SourceProfile {
        let workspace_id = self
            .workspace
            .captures(content)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| "Unknown".to_string());

        let mut profile = SourceProfile::new(source_id.clone(), workspace_id);

        if let Some(captures) = self.filename_pattern.captures(content) {
            profile.filename_pattern = captures[1].to_string();
        }

        for captures in self.schedule_row.captures_iter(content) {
            profile
                .upload_schedule
                .entry(captures[1].to_string())
                .or_insert_with(|| captures[2].to_string());
        }

        for captures in self.stats_row.captures_iter(content) {
            let cell = &captures[2];
            let stats = VolumeStats {
                mean: self.extract_number(&self.mean, cell),
                min: self.extract_number(&self.min, cell),
                max: self.extract_number(&self.max, cell),
            };
            profile
                .volume_stats
                .entry(captures[1].to_string())
                .or_insert(stats);
        }

        profile
    }

    /// Pull a stat value out of a table cell, tolerating thousands separators
    fn extract_number(&self, pattern: &Regex, cell: &str) -> Option<f64> {
        pattern
            .captures(cell)
            .and_then(|c| c[1].replace(',', "").parse::<f64>().ok())
    }
}
