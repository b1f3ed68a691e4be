//! Persistence layer: Diesel schema, row models, and query helpers.

pub mod db;
pub mod error;
pub mod model;
