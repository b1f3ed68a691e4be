//! Document ingestion, import, and recurring-event reconciliation.
//!
//! Every operation here is written against the collaborator traits in
//! [`store`], [`storage`], [`text_extract`] and [`extraction`], with
//! Postgres, filesystem and HTTP implementations provided alongside.

pub mod candidates;
pub mod error;
pub mod extraction;
pub mod import;
pub mod materialize;
pub mod pipeline;
pub mod series;
pub mod storage;
pub mod store;
pub mod text_extract;

#[cfg(test)]
mod test_support;
