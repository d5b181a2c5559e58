//! Prompt engineering for incident classification
//!
//! The prompt has two parts: a fixed instruction block describing the
//! detectors and output schema, and a [`Ruleset`] holding the severity
//! rules being tuned. Rulesets carry a version token so every evaluation
//! run can be traced back to the exact rules that produced it.

use serde::{Deserialize, Serialize};

use crate::SourceCase;

/// Versioned severity rules injected into the classification prompt
///
/// The rules are the part of the prompt operators iterate on between
/// evaluation runs; everything else stays fixed so metric movement can be
/// attributed to rule changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    /// Opaque version token recorded with every metric snapshot
    pub version: String,

    /// Severity rules, one statement per line of the prompt
    pub severity_rules: Vec<String>,
}

impl Ruleset {
    /// The initial severity rules the tuning loop starts from
    pub fn baseline() -> Self {
        Self {
            version: "v1-baseline".to_string(),
            severity_rules: vec![
                "**URGENT**: >1 urgent incident OR >3 total incidents.".to_string(),
                "**ATTENTION_REQUIRED**: At least 1 incident.".to_string(),
                "**ALL_GOOD**: No incidents.".to_string(),
            ],
        }
    }

    /// Load a ruleset from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize the ruleset to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Builds the classification prompt for one source case
pub struct PromptBuilder<'a> {
    case: &'a SourceCase,
    ruleset: &'a Ruleset,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder for a case under a ruleset
    pub fn new(case: &'a SourceCase, ruleset: &'a Ruleset) -> Self {
        Self { case, ruleset }
    }

    /// Build the complete classification prompt
    pub fn build(&self) -> String {
        let mut prompt = String::new();

        // 1. Role and detector instructions
        prompt.push_str(ANALYSIS_INSTRUCTIONS);
        prompt.push_str("\n\n");

        // 2. The case under analysis
        prompt.push_str(&format!("**Current Date**: {}\n", self.case.date));
        prompt.push_str(&format!("**Source ID**: {}\n\n", self.case.source_id));

        prompt.push_str("**Source Profile (patterns & stats)**:\n");
        match &self.case.profile {
            Some(profile) => prompt.push_str(&json_block(profile)),
            None => prompt.push_str("No profile document exists for this source."),
        }
        prompt.push_str("\n\n");

        prompt.push_str("**Files Uploaded Today**:\n");
        prompt.push_str(&json_block(&self.case.files));
        prompt.push_str("\n\n");

        prompt.push_str("**Files Uploaded Last Week (Same Weekday)**:\n");
        prompt.push_str(&json_block(&self.case.last_week_files));
        prompt.push_str("\n\n");

        // 3. The severity rules under tuning
        prompt.push_str("**Severity Rules**:\n");
        for rule in &self.ruleset.severity_rules {
            prompt.push_str(&format!("- {}\n", rule));
        }
        prompt.push('\n');

        // 4. Output schema reminder
        prompt.push_str(OUTPUT_FORMAT);

        prompt
    }
}

/// Pretty-printed JSON for a prompt section
fn json_block<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

const ANALYSIS_INSTRUCTIONS: &str = r#"You are an expert Data Incident Detection Agent. Your goal is to analyze the daily file uploads for a specific data source and detect anomalies based on its historical profile.

**Task**:
Analyze the "Files Uploaded Today" and identify any incidents based on the following detectors:
1. **Missing File**: Are files missing based on the schedule? (Check the upload schedule in the profile.)
2. **Duplicated/Failed File**: Are there files with `is_duplicated=true` or `status="STOPPED"/"FAILED"`? Or duplicate filenames?
3. **Unexpected Empty File**: Are there files with 0 rows? (Check whether 0 rows is expected based on the profile stats.)
4. **Unexpected Volume Variation**: Is the row count significantly different from the profile stats (Mean/Min/Max) or last week's files?
5. **Late Upload**: Were files uploaded significantly later (>4 hours) than the expected schedule?
6. **Previous File**: Is the file date (in the filename) significantly older than today?

**Important**:
- Be strict but reasonable.
- Use the provided profile stats to judge volume variations.
- Return ONLY valid JSON."#;

const OUTPUT_FORMAT: &str = r#"**Output Format**:
Return a JSON object with the following structure:
{
    "incidents": [
        {
            "incident_type": "Missing File" | "Duplicated File" | "Unexpected Empty File" | "Unexpected Volume Variation" | "File Upload After Schedule" | "Upload of Previous File" | "Failed File",
            "severity": "URGENT" | "ATTENTION_REQUIRED" | "ALL_GOOD",
            "description": "Brief explanation of the incident",
            "file_name": "Name of the file involved (or null if missing file)"
        }
    ],
    "status": "URGENT" | "ATTENTION_REQUIRED" | "ALL_GOOD",
    "recommendations": ["Rec 1", "Rec 2"]
}

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;

#[cfg(test)]
mod tests {
    use super::*;
    use feedwatch_domain::{SourceId, SourceProfile};

    fn case_with_profile(profile: Option<SourceProfile>) -> SourceCase {
        SourceCase {
            source_id: SourceId::new("220504"),
            date: "2025-09-10".parse().unwrap(),
            files: Vec::new(),
            last_week_files: Vec::new(),
            profile,
        }
    }

    #[test]
    fn test_prompt_includes_case_identity() {
        let case = case_with_profile(None);
        let ruleset = Ruleset::baseline();

        let prompt = PromptBuilder::new(&case, &ruleset).build();

        assert!(prompt.contains("**Source ID**: 220504"));
        assert!(prompt.contains("**Current Date**: 2025-09-10"));
    }

    #[test]
    fn test_prompt_includes_profile_json_when_present() {
        let profile = SourceProfile::new(SourceId::new("220504"), "88");
        let case = case_with_profile(Some(profile));

        let prompt = PromptBuilder::new(&case, &Ruleset::baseline()).build();

        assert!(prompt.contains("\"workspace_id\": \"88\""));
        assert!(!prompt.contains("No profile document"));
    }

    #[test]
    fn test_prompt_flags_missing_profile() {
        let prompt = PromptBuilder::new(&case_with_profile(None), &Ruleset::baseline()).build();
        assert!(prompt.contains("No profile document exists for this source."));
    }

    #[test]
    fn test_prompt_carries_ruleset_rules() {
        let tuned = Ruleset {
            version: "v2-volume-drop".to_string(),
            severity_rules: vec![
                "**URGENT**: any volume drop greater than 50% versus the weekday baseline."
                    .to_string(),
            ],
        };

        let case = case_with_profile(None);
        let prompt = PromptBuilder::new(&case, &tuned).build();

        assert!(prompt.contains("volume drop greater than 50%"));
        // The baseline rules are not baked in anywhere outside the ruleset.
        assert!(!prompt.contains(">3 total incidents"));
    }

    #[test]
    fn test_prompt_includes_detectors_and_schema() {
        let prompt = PromptBuilder::new(&case_with_profile(None), &Ruleset::baseline()).build();

        assert!(prompt.contains("Missing File"));
        assert!(prompt.contains("Unexpected Volume Variation"));
        assert!(prompt.contains("\"status\": \"URGENT\" | \"ATTENTION_REQUIRED\" | \"ALL_GOOD\""));
    }

    #[test]
    fn test_ruleset_toml_round_trip() {
        let ruleset = Ruleset::baseline();
        let toml_str = ruleset.to_toml().unwrap();
        let parsed = Ruleset::from_toml(&toml_str).unwrap();

        assert_eq!(parsed, ruleset);
    }

    #[test]
    fn test_ruleset_from_invalid_toml() {
        assert!(Ruleset::from_toml("version = ").is_err());
    }
}
