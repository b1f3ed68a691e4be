//! Candidate line filter.
//!
//! ## Summary
//! Keeps only normalized lines that contain a calendar-date-shaped substring,
//! bounding how many lines reach the completion service. The patterns are
//! deliberately loose: a false positive costs one extra extraction slot, a
//! false negative loses an event.
//!
//! Recognized shapes (case-insensitive):
//! - `Month DD[, YYYY]` (full or abbreviated month, optional ordinal suffix)
//! - `DD/MM[/YYYY]` numeric dates with `/`, `.` or `-` separators
//! - ISO `YYYY-MM-DD`
//! - `DD Month` (optionally `DD of Month`)
//! - `DD-Mon[-YYYY]` with `-`, `/` or `.` separators

use std::sync::LazyLock;

use regex::RegexSet;

use crate::normalize::NormalizedLine;

const MONTH: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?";

static DATE_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        // Month DD[, YYYY] ("Nov 3", "November 3 rd, 2025", "Sept. 8")
        format!(r"(?i)\b{MONTH}\s*\d{{1,2}}\b"),
        // DD/MM[/YYYY] and friends
        r"\b\d{1,2}[/.-]\d{1,2}(?:[/.-]\d{2,4})?\b".to_string(),
        // ISO YYYY-MM-DD
        r"\b\d{4}-\d{1,2}-\d{1,2}\b".to_string(),
        // DD Month ("3 November", "3 rd of Nov")
        format!(r"(?i)\b\d{{1,2}}\s*(?:st|nd|rd|th)?\s+(?:of\s+)?{MONTH}\b"),
        // DD-Mon[-YYYY] ("3-Nov-2025", "14/June")
        format!(r"(?i)\b\d{{1,2}}[-/.]{MONTH}(?:[-/.\s]\d{{2,4}})?\b"),
    ])
    .expect("valid date pattern set")
});

/// ## Summary
/// Returns `true` if the text contains at least one date-shaped substring.
#[must_use]
pub fn is_candidate(text: &str) -> bool {
    DATE_PATTERNS.is_match(text)
}

/// Stateless filter over normalized lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct CandidateFilter;

impl CandidateFilter {
    /// ## Summary
    /// Retains the lines that may contain a date, preserving line order.
    #[must_use]
    pub fn retain(self, lines: Vec<NormalizedLine>) -> Vec<NormalizedLine> {
        let total = lines.len();
        let kept: Vec<NormalizedLine> = lines
            .into_iter()
            .filter(|line| is_candidate(&line.text))
            .collect();

        tracing::debug!(total, kept = kept.len(), "Filtered candidate lines");
        kept
    }
}
