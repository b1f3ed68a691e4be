//! HTTP surface for document ingestion and calendar reconciliation.

pub mod app;
pub mod error;
pub mod services;
