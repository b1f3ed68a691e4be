//! Sequential batch driver.
//!
//! Batches run strictly one after another in line order, separated by a fixed
//! delay. After every batch the results are handed to a [`BatchSink`], which
//! persists them before the next batch starts. A batch that fails is recorded
//! in the [`RunSummary`] and contributes no results; it never stops the run.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use almanac_core::config::ExtractionConfig;
use almanac_core::constants::EXTRACTION_BATCH_SIZE;
use almanac_text::NormalizedLine;

use super::prompt::BatchRequest;
use super::response::{LineExtraction, parse_response};
use super::retry::RetryPolicy;
use super::CompletionClient;
use crate::error::{CompletionError, ServiceResult};

/// Position of a batch within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub batch_index: usize,
    pub batch_count: usize,
}

/// Receives each batch's results as soon as they are parsed.
#[async_trait]
pub trait BatchSink: Send + Sync {
    /// Persists one batch and returns how many records were stored.
    async fn accept(&self, progress: BatchProgress, results: Vec<LineExtraction>) -> ServiceResult<usize>;
}

/// Totals threaded through the batch loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub persisted: usize,
    pub failed_batches: Vec<usize>,
}

/// Outcome of one batch step.
#[derive(Debug)]
struct BatchStep {
    batch_index: usize,
    persisted: usize,
    error: Option<CompletionError>,
}

impl RunSummary {
    fn fold(mut self, step: BatchStep) -> Self {
        self.batches += 1;
        self.persisted += step.persisted;
        if step.error.is_some() {
            self.failed_batches.push(step.batch_index);
        }
        self
    }
}

/// Turns candidate lines into per-line extraction results, batch by batch.
pub struct BatchExtractor {
    client: Arc<dyn CompletionClient>,
    retry: RetryPolicy,
    batch_size: usize,
    inter_batch_delay: Duration,
}

impl BatchExtractor {
    #[must_use]
    pub fn new(
        client: Arc<dyn CompletionClient>,
        retry: RetryPolicy,
        batch_size: usize,
        inter_batch_delay: Duration,
    ) -> Self {
        Self {
            client,
            retry,
            batch_size: batch_size.max(1),
            inter_batch_delay,
        }
    }

    #[must_use]
    pub fn from_config(client: Arc<dyn CompletionClient>, config: &ExtractionConfig) -> Self {
        let batch_size = if config.batch_size == 0 {
            EXTRACTION_BATCH_SIZE
        } else {
            config.batch_size
        };

        Self::new(
            client,
            RetryPolicy::from_config(config),
            batch_size,
            Duration::from_millis(config.inter_batch_delay_ms),
        )
    }

    /// ## Summary
    /// Extracts results for one batch.
    ///
    /// Transport and server failures are retried per the [`RetryPolicy`]. If
    /// the response cannot be parsed, the same request is sent exactly once
    /// more without further retries. Results naming a line outside the batch
    /// are discarded.
    ///
    /// ## Errors
    /// Returns the final `CompletionError` when the batch yields no usable
    /// response.
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn extract_batch(
        &self,
        batch_index: usize,
        lines: &[NormalizedLine],
    ) -> Result<Vec<LineExtraction>, CompletionError> {
        let request = BatchRequest::from_lines(lines);

        let content = self
            .retry
            .run(|attempt| {
                tracing::trace!(batch_index, attempt, "Sending extraction batch");
                self.client.complete(&request)
            })
            .await?;

        let results = match parse_response(&content) {
            Ok(results) => results,
            Err(first) => {
                tracing::warn!(batch_index, error = %first, "Malformed completion output, retrying once");
                let content = self.client.complete(&request).await?;
                parse_response(&content)?
            }
        };

        let known: BTreeSet<usize> = lines.iter().map(|line| line.line_number).collect();
        let (kept, stray): (Vec<_>, Vec<_>) = results
            .into_iter()
            .partition(|result| known.contains(&result.line_number));
        for result in &stray {
            tracing::warn!(batch_index, line_number = result.line_number, "Dropping result for a line outside the batch");
        }

        Ok(kept)
    }

    /// ## Summary
    /// Runs every batch in order, handing each batch's results to `sink`
    /// before the next batch starts.
    ///
    /// ## Errors
    /// Returns an error only if the sink fails; completion failures are
    /// absorbed per batch.
    #[tracing::instrument(skip_all, fields(lines = lines.len(), batch_size = self.batch_size))]
    pub async fn run<S>(&self, lines: &[NormalizedLine], sink: &S) -> ServiceResult<RunSummary>
    where
        S: BatchSink + ?Sized,
    {
        let batch_count = lines.len().div_ceil(self.batch_size);
        let mut summary = RunSummary::default();

        for (batch_index, batch) in lines.chunks(self.batch_size).enumerate() {
            if batch_index > 0 {
                tokio::time::sleep(self.inter_batch_delay).await;
            }

            let (results, error) = match self.extract_batch(batch_index, batch).await {
                Ok(results) => (results, None),
                Err(error) => {
                    tracing::warn!(
                        batch_index,
                        first_line = batch.first().map(|line| line.line_number),
                        error = %error,
                        "Extraction batch failed, continuing with zero results"
                    );
                    (Vec::new(), Some(error))
                }
            };

            let progress = BatchProgress {
                batch_index,
                batch_count,
            };
            let persisted = sink.accept(progress, results).await?;

            summary = summary.fold(BatchStep {
                batch_index,
                persisted,
                error,
            });
        }

        tracing::debug!(
            batches = summary.batches,
            persisted = summary.persisted,
            failed = summary.failed_batches.len(),
            "Extraction run finished"
        );

        Ok(summary)
    }
}
