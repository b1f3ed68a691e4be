pub mod calendar_event;
pub mod candidate;
pub mod document;
pub mod extracted_event;
pub mod series;
