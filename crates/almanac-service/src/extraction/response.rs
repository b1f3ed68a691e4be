//! Strict result type for one extraction batch.

use serde::Deserialize;

use crate::error::CompletionError;

/// One per-line result reported by the completion service.
///
/// Only `line_number` and `event` are required; every other field may be
/// missing or null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LineExtraction {
    pub line_number: usize,
    pub event: String,
    #[serde(default)]
    pub date_text: Option<String>,
    #[serde(default)]
    pub normalized_date: Option<String>,
    #[serde(default)]
    pub normalized_end_date: Option<String>,
    #[serde(default)]
    pub day_of_week: Option<String>,
    #[serde(default)]
    pub recurrence_pattern: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_range_with_day: bool,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    events: Option<Vec<LineExtraction>>,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// ## Summary
/// Parses the message content of a completion into per-line results.
///
/// A missing or null `events` array is an empty batch. Content wrapped in a
/// Markdown code fence is accepted.
///
/// ## Errors
/// Returns `CompletionError::MalformedOutput` if the content is not a JSON
/// object matching the batch contract.
pub fn parse_response(content: &str) -> Result<Vec<LineExtraction>, CompletionError> {
    let body = strip_code_fence(content);
    let response: BatchResponse = serde_json::from_str(body)
        .map_err(|err| CompletionError::MalformedOutput(err.to_string()))?;
    Ok(response.events.unwrap_or_default())
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim)
}
