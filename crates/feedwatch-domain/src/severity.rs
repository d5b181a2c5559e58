//! Severity module - incident severity labels

use serde::{Deserialize, Serialize};

/// Severity label assigned to a source for one evaluation day
///
/// Labels are ordered by criticality, lowest first:
/// - AllGood: no incidents detected
/// - AttentionRequired: at least one incident worth a look
/// - Urgent: requires immediate action
///
/// The derived `Ord` follows that ordering, so `Severity::Urgent` is the
/// maximum and `a.max(b)` yields the more critical of two labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// No incidents detected
    AllGood,

    /// At least one incident, not yet critical
    AttentionRequired,

    /// Critical, requires immediate action
    Urgent,
}

impl Severity {
    /// Get the severity name as its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::AllGood => "ALL_GOOD",
            Severity::AttentionRequired => "ATTENTION_REQUIRED",
            Severity::Urgent => "URGENT",
        }
    }

    /// Parse a severity from a wire string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ALL_GOOD" => Some(Severity::AllGood),
            "ATTENTION_REQUIRED" => Some(Severity::AttentionRequired),
            "URGENT" => Some(Severity::Urgent),
            _ => None,
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid severity: {}", s))
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
