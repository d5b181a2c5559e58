//! Parse classifier output into a source report
//!
//! Parsing is strict about the one field evaluation depends on and tolerant
//! about the rest. A missing or unknown `status` makes the whole response
//! invalid: the caller records the source as unscored rather than guessing
//! a severity for it. Malformed incident entries, by contrast, are logged
//! and skipped; they only cost report detail.

use serde_json::Value;
use tracing::warn;

use feedwatch_domain::{Incident, Severity, SourceId, SourceReport};

use crate::AgentError;

/// Parse a classifier JSON response into the source's report
pub fn parse_verdict(source_id: &SourceId, response: &str) -> Result<SourceReport, AgentError> {
    let json_str = extract_json(response)?;

    let json: Value = serde_json::from_str(&json_str)
        .map_err(|e| AgentError::InvalidResponse(format!("JSON parse error: {}", e)))?;

    let obj = json
        .as_object()
        .ok_or_else(|| AgentError::InvalidResponse("Expected JSON object".to_string()))?;

    let status_str = obj
        .get("status")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AgentError::InvalidResponse("Missing or invalid 'status'".to_string()))?;
    let status = Severity::parse(status_str)
        .ok_or_else(|| AgentError::InvalidResponse(format!("Unknown status: {}", status_str)))?;

    let mut incidents = Vec::new();
    if let Some(items) = obj.get("incidents").and_then(|v| v.as_array()) {
        for (idx, item) in items.iter().enumerate() {
            match serde_json::from_value::<Incident>(item.clone()) {
                Ok(incident) => incidents.push(incident),
                Err(e) => {
                    warn!(source = %source_id, index = idx, error = %e, "skipping malformed incident");
                }
            }
        }
    }

    let recommendations = obj
        .get("recommendations")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    Ok(SourceReport {
        source_id: source_id.clone(),
        incidents,
        status,
        recommendations,
    })
}

/// Extract JSON from a response, handling markdown code blocks
///
/// The model is asked for raw JSON but sometimes wraps it in a fence
/// anyway.
fn extract_json(response: &str) -> Result<String, AgentError> {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        if lines.len() < 2 {
            return Err(AgentError::InvalidResponse("Empty code block".to_string()));
        }

        // Skip the opening fence line and the closing fence.
        let json_lines = &lines[1..lines.len().saturating_sub(1)];
        Ok(json_lines.join("\n"))
    } else {
        Ok(trimmed.to_string())
    }
}
