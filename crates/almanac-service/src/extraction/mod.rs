//! Batched extraction against an external completion service.
//!
//! Candidate lines are grouped into fixed-size batches and sent one batch at
//! a time. Each response is validated against a strict per-batch result type
//! before anything downstream sees it.

pub mod batch;
pub mod client;
pub mod prompt;
pub mod response;
pub mod retry;

use async_trait::async_trait;

use crate::error::CompletionError;

pub use batch::{BatchExtractor, BatchProgress, BatchSink, RunSummary};
pub use client::HttpCompletionClient;
pub use prompt::BatchRequest;
pub use response::{LineExtraction, parse_response};
pub use retry::RetryPolicy;

/// A completion service that answers one batch request with raw JSON text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends one request and returns the message content unparsed.
    async fn complete(&self, request: &BatchRequest) -> Result<String, CompletionError>;
}
