//! Title normalization for duplicate and recurrence detection.
//!
//! ## Summary
//! Produces a comparison key from an event title. Two titles that differ only
//! in case, punctuation, or spacing normalize to the same key.

use icu::casemap::CaseMapper;

/// Normalize an event title into a comparison key.
///
/// Case-folds, replaces every non-alphanumeric character with a space,
/// and collapses runs of whitespace.
///
/// Examples:
/// - "Team Stand-up" -> "team stand up"
/// - "  CHEM  101 lab " -> "chem 101 lab"
#[must_use]
pub fn normalize_title(title: &str) -> String {
    CaseMapper::new()
        .fold_string(title)
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
