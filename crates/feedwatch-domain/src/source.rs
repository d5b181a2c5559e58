//! Source module - data source identity and upload profile

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a data source
///
/// Source ids are string tokens assigned by the ingestion platform
/// (typically numeric, e.g. "220504", but never interpreted as numbers).
/// The ordering is lexicographic so that maps keyed by source id iterate
/// deterministically.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Create a source id from any string-like token
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Row-count statistics for one day of the week
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VolumeStats {
    /// Mean row count across historical uploads
    pub mean: Option<f64>,
    /// Minimum observed row count
    pub min: Option<f64>,
    /// Maximum observed row count
    pub max: Option<f64>,
}

/// Historical upload profile for a data source
///
/// Parsed from the source's markdown profile document and passed opaquely to
/// the classifier as anomaly-detection context. Schedules and statistics are
/// keyed by three-letter day-of-week tokens ("Mon".."Sun") as they appear in
/// the profile tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
    /// The source this profile describes
    pub source_id: SourceId,

    /// Workspace the source belongs to
    pub workspace_id: String,

    /// Common filename structure, e.g. "report_{YYYYMMDD}.csv"
    pub filename_pattern: String,

    /// Expected upload time per day of week, "HH:MM" in UTC
    pub upload_schedule: BTreeMap<String, String>,

    /// Row-count statistics per day of week
    pub volume_stats: BTreeMap<String, VolumeStats>,
}

impl SourceProfile {
    /// Create an empty profile for a source
    pub fn new(source_id: SourceId, workspace_id: impl Into<String>) -> Self {
        Self {
            source_id,
            workspace_id: workspace_id.into(),
            filename_pattern: String::new(),
            upload_schedule: BTreeMap::new(),
            volume_stats: BTreeMap::new(),
        }
    }

    /// Expected upload time for a day token ("Mon".."Sun"), if scheduled
    pub fn scheduled_time(&self, day: &str) -> Option<&str> {
        self.upload_schedule.get(day).map(String::as_str)
    }

    /// Volume statistics for a day token, if known
    pub fn volume_for(&self, day: &str) -> Option<&VolumeStats> {
        self.volume_stats.get(day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_ordering_is_lexicographic() {
        let a = SourceId::new("195385");
        let b = SourceId::new("220504");
        assert!(a < b);
    }

    #[test]
    fn test_profile_lookups() {
        let mut profile = SourceProfile::new(SourceId::new("220504"), "88");
        profile
            .upload_schedule
            .insert("Mon".to_string(), "15:00".to_string());
        profile.volume_stats.insert(
            "Mon".to_string(),
            VolumeStats {
                mean: Some(5953.54),
                min: Some(1.0),
                max: Some(10762.0),
            },
        );

        assert_eq!(profile.scheduled_time("Mon"), Some("15:00"));
        assert_eq!(profile.scheduled_time("Tue"), None);
        assert_eq!(profile.volume_for("Mon").and_then(|v| v.min), Some(1.0));
    }
}
