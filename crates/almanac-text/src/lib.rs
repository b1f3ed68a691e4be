//! Pure text and calendar-date logic for document ingestion.
//!
//! Nothing in this crate performs I/O. The pipeline stages that live here
//! are deterministic and are shared by the extraction pipeline and the
//! import path.

pub mod date;
pub mod error;
pub mod expand;
pub mod filter;
pub mod normalize;
pub mod rule;
pub mod weekday;

pub use expand::expand;
pub use filter::{CandidateFilter, is_candidate};
pub use normalize::{NormalizedLine, normalize_lines, normalize_text};
pub use weekday::WeekdaySet;
