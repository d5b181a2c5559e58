//! Daily upload log loading
//!
//! The ingestion platform drops one directory per day,
//! `Files/<date>_20_00_UTC/`, holding `files.json` (today's uploads per
//! source) and `files_last_weekday.json` (the same weekday one week back,
//! used as a volume baseline). `files.json` is required; the baseline file
//! is not present for every day and its absence is tolerated.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, warn};

use feedwatch_domain::{FileRecord, SourceId};

use crate::error::IngestError;

/// Upload records for one evaluation date, keyed by source
#[derive(Debug, Clone)]
pub struct UploadIndex {
    /// The date the log covers
    pub date: NaiveDate,

    today: BTreeMap<SourceId, Vec<FileRecord>>,
    last_weekday: BTreeMap<SourceId, Vec<FileRecord>>,
}

impl UploadIndex {
    /// Load the upload log for a date from the data directory
    ///
    /// Fails with [`IngestError::FilesNotFound`] when the day's `files.json`
    /// does not exist. Individual records that fail to deserialize are
    /// logged and skipped so one malformed row cannot sink the whole day.
    pub fn load(data_dir: &Path, date: NaiveDate) -> Result<Self, IngestError> {
        let day_dir = day_directory(data_dir, date);

        let files_path = day_dir.join("files.json");
        if !files_path.exists() {
            return Err(IngestError::FilesNotFound {
                date,
                path: files_path,
            });
        }
        let today = parse_source_map(&fs::read_to_string(&files_path)?)?;

        let baseline_path = day_dir.join("files_last_weekday.json");
        let last_weekday = if baseline_path.exists() {
            parse_source_map(&fs::read_to_string(&baseline_path)?)?
        } else {
            warn!(date = %date, "files_last_weekday.json not found, continuing without baseline");
            BTreeMap::new()
        };

        debug!(
            date = %date,
            sources = today.len(),
            baseline_sources = last_weekday.len(),
            "loaded upload log"
        );

        Ok(Self {
            date,
            today,
            last_weekday,
        })
    }

    /// Sources present in today's log, in source-id order
    pub fn sources(&self) -> impl Iterator<Item = &SourceId> {
        self.today.keys()
    }

    /// Today's uploads for a source (empty when the source is absent)
    pub fn files_for(&self, source_id: &SourceId) -> &[FileRecord] {
        self.today.get(source_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Last weekday's uploads for a source (empty when unknown)
    pub fn last_weekday_for(&self, source_id: &SourceId) -> &[FileRecord] {
        self.last_weekday
            .get(source_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of sources in today's log
    pub fn len(&self) -> usize {
        self.today.len()
    }

    /// Whether today's log is empty
    pub fn is_empty(&self) -> bool {
        self.today.is_empty()
    }
}

/// Directory holding one day's upload log
fn day_directory(data_dir: &Path, date: NaiveDate) -> PathBuf {
    data_dir
        .join("Files")
        .join(format!("{}_20_00_UTC", date.format("%Y-%m-%d")))
}

/// Parse a `{source_id: [records...]}` map, skipping malformed records
fn parse_source_map(raw: &str) -> Result<BTreeMap<SourceId, Vec<FileRecord>>, IngestError> {
    let json: BTreeMap<String, Vec<Value>> = serde_json::from_str(raw)?;

    let mut parsed = BTreeMap::new();
    for (source_id, items) in json {
        let mut records = Vec::with_capacity(items.len());
        for (idx, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<FileRecord>(item) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(source = %source_id, index = idx, error = %e, "skipping malformed file record");
                }
            }
        }
        parsed.insert(SourceId::new(source_id), records);
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const DATE: &str = "2025-09-10";

    fn write_day_file(dir: &TempDir, name: &str, content: &str) {
        let day_dir = dir.path().join("Files").join(format!("{}_20_00_UTC", DATE));
        fs::create_dir_all(&day_dir).unwrap();
        fs::write(day_dir.join(name), content).unwrap();
    }

    fn record_json(filename: &str, rows: u64) -> String {
        format!(
            r#"{{"filename": "{}", "rows": {}, "status": "COMPLETED", "is_duplicated": false, "uploaded_at": "2025-09-10T15:02:11Z"}}"#,
            filename, rows
        )
    }

    #[test]
    fn test_load_missing_files_json_is_fatal() {
        let dir = TempDir::new().unwrap();

        let err = UploadIndex::load(dir.path(), DATE.parse().unwrap()).unwrap_err();
        match err {
            IngestError::FilesNotFound { date, .. } => {
                assert_eq!(date.to_string(), DATE);
            }
            other => panic!("expected FilesNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_load_without_baseline_is_tolerated() {
        let dir = TempDir::new().unwrap();
        write_day_file(
            &dir,
            "files.json",
            &format!(r#"{{"220504": [{}]}}"#, record_json("a.csv", 10)),
        );

        let index = UploadIndex::load(dir.path(), DATE.parse().unwrap()).unwrap();

        assert_eq!(index.len(), 1);
        assert_eq!(index.files_for(&SourceId::new("220504")).len(), 1);
        assert!(index.last_weekday_for(&SourceId::new("220504")).is_empty());
    }

    #[test]
    fn test_malformed_record_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        write_day_file(
            &dir,
            "files.json",
            &format!(
                r#"{{"220504": [{}, {{"filename": "broken.csv"}}, {}]}}"#,
                record_json("a.csv", 10),
                record_json("b.csv", 20)
            ),
        );

        let index = UploadIndex::load(dir.path(), DATE.parse().unwrap()).unwrap();

        let files = index.files_for(&SourceId::new("220504"));
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "a.csv");
        assert_eq!(files[1].filename, "b.csv");
    }

    #[test]
    fn test_sources_iterate_in_id_order() {
        // Scope limits downstream take the first sources in id order, so
        // iteration order is part of the contract, not an accident.
        let dir = TempDir::new().unwrap();
        write_day_file(
            &dir,
            "files.json",
            &format!(
                r#"{{"3": [{}], "1": [{}], "2": [{}]}}"#,
                record_json("c.csv", 1),
                record_json("a.csv", 1),
                record_json("b.csv", 1)
            ),
        );

        let index = UploadIndex::load(dir.path(), DATE.parse().unwrap()).unwrap();

        let ids: Vec<&str> = index.sources().map(SourceId::as_str).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}
