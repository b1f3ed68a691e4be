//! OCR-noise normalization for extracted document text.
//!
//! ## Summary
//! Turns raw extracted text into clean, numbered lines. The transform is
//! pure and idempotent: `normalize_text(&normalize_text(x)) == normalize_text(x)`.
//!
//! Rules, applied in order to every line:
//! 1. strip non-printable control characters
//! 2. map curly quotes and dash variants to ASCII
//! 3. split glued words at lower→upper and letter↔digit boundaries
//! 4. collapse whitespace runs to a single space and trim
//!
//! Lines that are empty after trimming are dropped.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// One cleaned line of document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedLine {
    /// 1-indexed position among the retained (non-blank) lines.
    pub line_number: usize,
    pub text: String,
}

/// ## Summary
/// Normalizes raw text into numbered, non-blank lines.
///
/// Line numbers count retained lines only, so
/// `normalize_lines(&normalize_text(x)) == normalize_lines(x)`.
#[must_use]
pub fn normalize_lines(raw: &str) -> Vec<NormalizedLine> {
    raw.split('\n')
        .map(normalize_line)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(idx, text)| NormalizedLine {
            line_number: idx + 1,
            text,
        })
        .collect()
}

/// ## Summary
/// Normalizes raw text and joins the retained lines with `\n`.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    normalize_lines(raw)
        .into_iter()
        .map(|line| line.text)
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_line(line: &str) -> String {
    let stripped: String = line
        .chars()
        .filter(|c| !c.is_control() || *c == '\t')
        .map(ascii_punctuation)
        .collect();

    let unglued = split_glued_words(&stripped);

    WHITESPACE_RUN.replace_all(&unglued, " ").trim().to_string()
}

const fn ascii_punctuation(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => '"',
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' => '-',
        '\u{00A0}' | '\u{2007}' | '\u{202F}' => ' ',
        other => other,
    }
}

fn split_glued_words(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 8);
    let mut prev: Option<char> = None;

    for c in line.chars() {
        if let Some(p) = prev
            && is_glue_boundary(p, c)
        {
            out.push(' ');
        }
        out.push(c);
        prev = Some(c);
    }

    out
}

fn is_glue_boundary(prev: char, next: char) -> bool {
    let lower_to_upper = prev.is_lowercase() && next.is_uppercase();
    let letter_to_digit = prev.is_alphabetic() && next.is_ascii_digit();
    let digit_to_letter = prev.is_ascii_digit() && next.is_alphabetic();

    lower_to_upper || letter_to_digit || digit_to_letter
}
