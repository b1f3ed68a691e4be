//! Database enum types with Diesel serialization.
//!
//! This module provides type-safe enum wrappers for database CHECK constraints.
//! Each enum implements `ToSql` and `FromSql` for automatic conversion between Rust and `PostgreSQL`,
//! and serializes to the same string over JSON.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use almanac_core::error::CoreError;

/// Declares a closed enumeration stored as `TEXT`.
///
/// Generates `as_str`, `Display`, `FromStr`, and the Diesel `ToSql`/`FromSql` impls.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            AsExpression,
            FromSqlRow,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Returns the database string representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                match bytes.as_bytes() {
                    $(b if b == $text.as_bytes() => Ok(Self::$variant),)+
                    _ => Err("Unrecognized enum variant".into()),
                }
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err(CoreError::UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum! {
    /// Document processing lifecycle.
    ///
    /// Maps to `document.status` CHECK constraint.
    DocumentStatus {
        Pending => "pending",
        Processing => "processing",
        Completed => "completed",
        Error => "error",
    }
}

text_enum! {
    /// Event category shared by extracted events, calendar events, and series.
    EventCategory {
        Meeting => "meeting",
        Deadline => "deadline",
        Exam => "exam",
        Class => "class",
        Appointment => "appointment",
        Social => "social",
        Holiday => "holiday",
        Other => "other",
    }
}

text_enum! {
    /// Event priority.
    Priority {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

text_enum! {
    /// Where a calendar event came from.
    ///
    /// Maps to `calendar_event.source` CHECK constraint.
    CalendarSource {
        Manual => "manual",
        Extracted => "extracted",
        ExternalCalendar => "external-calendar",
        Messaging => "messaging",
    }
}

text_enum! {
    /// Where a series definition came from.
    ///
    /// Maps to `event_series.source` CHECK constraint.
    SeriesSource {
        Manual => "manual",
        Extracted => "extracted",
        Detected => "detected",
    }
}

text_enum! {
    /// Review state of a detected recurring pattern.
    ///
    /// Maps to `recurring_candidate.status` CHECK constraint.
    CandidateStatus {
        Pending => "pending",
        Accepted => "accepted",
        Rejected => "rejected",
    }
}

impl Default for EventCategory {
    fn default() -> Self {
        Self::Other
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::Medium
    }
}

impl EventCategory {
    /// ## Summary
    /// Maps free text from the completion service onto a category.
    ///
    /// Unknown labels fall back to `Other` rather than failing the result.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }
}
