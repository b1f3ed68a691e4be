//! Request contract for one extraction batch.

use serde::Serialize;

use almanac_text::NormalizedLine;

/// Key of the array the completion service must wrap its results in.
pub const RESULTS_KEY: &str = "events";

pub const SCHEMA_HINT: &str = "strict JSON object with an array field";

/// Instructions sent as the system message of every batch.
pub const SYSTEM_PROMPT: &str = r#"You extract calendar events from numbered document lines.

Reply with one JSON object of the form {"events": [...]}. For every line that contains an explicit date, emit exactly one object with these fields:
- "line_number": the number printed before the line
- "event": a short title for what happens on that date
- "date_text": the date exactly as written in the line
- "normalized_date": the date as YYYY-MM-DD, or null if the year is not stated
- "normalized_end_date": the end of a date range as YYYY-MM-DD, or null
- "day_of_week": weekday names for ranges like "Mondays, Nov 3 - Nov 17", or null
- "recurrence_pattern": "weekly", "daily", "monthly" or null
- "is_range_with_day": true only when the line gives a start date, an end date and weekdays
Optional fields: "start_time" and "end_time" as HH:MM, "location", "description", "category" (meeting, deadline, exam, class, appointment, social, holiday, other), "priority" (low, medium, high).

Never guess a missing year. Never expand a range into individual dates. Lines without a date produce nothing. If no line has a date, reply {"events": []}."#;

/// The body of one extraction request: numbered lines and the output hint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchRequest {
    pub lines: Vec<String>,
    pub schema_hint: &'static str,
}

impl BatchRequest {
    /// ## Summary
    /// Numbers each line as `"<n>: <text>"` using its document line number.
    #[must_use]
    pub fn from_lines(lines: &[NormalizedLine]) -> Self {
        Self {
            lines: lines
                .iter()
                .map(|line| format!("{}: {}", line.line_number, line.text))
                .collect(),
            schema_hint: SCHEMA_HINT,
        }
    }

    /// ## Summary
    /// Renders the user message: the numbered lines followed by the hint.
    #[must_use]
    pub fn user_message(&self) -> String {
        format!(
            "{}\n\nRespond with a {} named \"{RESULTS_KEY}\".",
            self.lines.join("\n"),
            self.schema_hint
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_keep_document_numbering() {
        let lines = vec![
            NormalizedLine {
                line_number: 4,
                text: "Quiz Sept 8".to_string(),
            },
            NormalizedLine {
                line_number: 9,
                text: "Final 2025-12-15".to_string(),
            },
        ];

        let request = BatchRequest::from_lines(&lines);
        assert_eq!(request.lines, vec!["4: Quiz Sept 8", "9: Final 2025-12-15"]);
        assert!(request.user_message().starts_with("4: Quiz Sept 8\n9: Final 2025-12-15\n\n"));
        assert!(request.user_message().contains("\"events\""));
    }
}
