//! Weekday token parsing.
//!
//! The completion service reports weekdays as free text ("Mondays and
//! Wednesdays", "Tue/Thurs", "weekdays"). `WeekdaySet` normalizes those
//! tokens into a set keyed by the 0–6 Sunday-first numbering.

use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A set of weekdays stored as a bitmask (bit 0 = Sunday … bit 6 = Saturday).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

/// Sunday-first order used for iteration and for the 0–6 numbering.
const ORDER: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

impl WeekdaySet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// ## Summary
    /// Parses a free-text weekday description.
    ///
    /// Accepts full names, three-letter abbreviations, the irregular
    /// abbreviations `tues`/`thur`/`thurs`/`weds`, plural full names
    /// ("mondays"), and the group words `weekdays`/`weekends`. Two days joined
    /// by a dash, `to`, `thru` or `through` ("Mon-Fri") cover every day in
    /// between, wrapping past Saturday. Unrecognized tokens are ignored, so
    /// text with no recognizable weekday yields an empty set.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let tokens = tokenize(text);
        let mut set = Self::empty();
        let mut rest = tokens.as_slice();

        while let Some((first, tail)) = rest.split_first() {
            if let (Token::Word(from), [Token::Through, Token::Word(to), after @ ..]) = (first, tail)
                && let (Some(from), Some(to)) = (parse_day_word(from), parse_day_word(to))
            {
                set = set.union(Self::span(from, to));
                rest = after;
                continue;
            }

            if let Token::Word(word) = first {
                set = set.union(Self::from_word(word));
            }
            rest = tail;
        }

        set
    }

    fn from_word(word: &str) -> Self {
        match word {
            "weekday" | "weekdays" => Self::from_iter([
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ]),
            "weekend" | "weekends" => Self::from_iter([Weekday::Sat, Weekday::Sun]),
            other => parse_day_word(other).map_or_else(Self::empty, Self::single),
        }
    }

    /// Every day from `from` to `to` inclusive, walking forward through the week.
    fn span(from: Weekday, to: Weekday) -> Self {
        let mut set = Self::single(from);
        let mut day = from;
        while day != to {
            day = day.succ();
            set = set.insert(day);
        }
        set
    }

    #[must_use]
    pub fn single(day: Weekday) -> Self {
        Self(1 << day.num_days_from_sunday())
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub fn insert(self, day: Weekday) -> Self {
        self.union(Self::single(day))
    }

    #[must_use]
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Weekdays in Sunday-first order.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        ORDER.into_iter().filter(move |day| self.contains(*day))
    }

    /// The 0–6 (Sunday = 0) numbers of the contained weekdays, ascending.
    #[must_use]
    pub fn numbers(self) -> Vec<u32> {
        self.iter().map(|day| day.num_days_from_sunday()).collect()
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::insert)
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|day| day.to_string()).collect();
        f.write_str(&names.join(","))
    }
}

// Serialized as the ascending list of 0–6 numbers, e.g. `[1, 3]`.
impl Serialize for WeekdaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.numbers().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for WeekdaySet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let numbers = Vec::<u32>::deserialize(deserializer)?;
        numbers.into_iter().try_fold(Self::empty(), |set, n| {
            usize::try_from(n)
                .ok()
                .and_then(|idx| ORDER.get(idx))
                .map(|day| set.insert(*day))
                .ok_or_else(|| serde::de::Error::custom(format!("weekday number out of range: {n}")))
        })
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Word(String),
    Through,
}

/// Lowercased alphabetic words plus range markers; other punctuation separates.
fn tokenize(text: &str) -> Vec<Token> {
    fn push_word(tokens: &mut Vec<Token>, word: &mut String) {
        if word.is_empty() {
            return;
        }
        let word = std::mem::take(word);
        tokens.push(match word.as_str() {
            "to" | "thru" | "through" => Token::Through,
            _ => Token::Word(word),
        });
    }

    let mut tokens = Vec::new();
    let mut word = String::new();
    for c in text.chars() {
        if c.is_alphabetic() {
            word.extend(c.to_lowercase());
            continue;
        }
        push_word(&mut tokens, &mut word);
        if matches!(c, '-' | '\u{2013}' | '\u{2014}') {
            tokens.push(Token::Through);
        }
    }
    push_word(&mut tokens, &mut word);
    tokens
}

/// A weekday token, also accepting the plural of a full day name ("fridays").
fn parse_day_word(word: &str) -> Option<Weekday> {
    parse_weekday_token(word).or_else(|| {
        word.strip_suffix('s')
            .filter(|singular| singular.ends_with("day"))
            .and_then(parse_weekday_token)
    })
}

/// ## Summary
/// Parses a single weekday token (already lowercased).
#[must_use]
pub fn parse_weekday_token(token: &str) -> Option<Weekday> {
    match token {
        "sun" | "sunday" => Some(Weekday::Sun),
        "mon" | "monday" => Some(Weekday::Mon),
        "tue" | "tues" | "tuesday" => Some(Weekday::Tue),
        "wed" | "weds" | "wednesday" => Some(Weekday::Wed),
        "thu" | "thur" | "thurs" | "thursday" => Some(Weekday::Thu),
        "fri" | "friday" => Some(Weekday::Fri),
        "sat" | "saturday" => Some(Weekday::Sat),
        _ => None,
    }
}
