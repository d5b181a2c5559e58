//! Upload module - file upload records from the daily ingestion log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One file upload as recorded by the ingestion platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Uploaded file name
    pub filename: String,

    /// Number of rows ingested from the file
    pub rows: u64,

    /// Platform processing status, e.g. "COMPLETED", "FAILED", "STOPPED"
    pub status: String,

    /// Whether the platform flagged this upload as a duplicate
    pub is_duplicated: bool,

    /// File size in bytes, when reported
    #[serde(default)]
    pub file_size: Option<f64>,

    /// Upload timestamp (UTC)
    pub uploaded_at: DateTime<Utc>,

    /// Free-form status detail from the platform, when present
    #[serde(default)]
    pub status_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_default_on_deserialize() {
        let json = r#"{
            "filename": "report_20250910.csv",
            "rows": 10,
            "status": "COMPLETED",
            "is_duplicated": false,
            "uploaded_at": "2025-09-10T15:02:11Z"
        }"#;

        let parsed: FileRecord = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.file_size, None);
        assert_eq!(parsed.status_message, None);
    }
}
