//! Document ingestion: upload, deletion, and the extraction run.
//!
//! A run claims the document, downloads and decodes it, normalizes and
//! filters its lines, and then drives the batch extractor. Every batch is
//! materialized and persisted before the next one starts, so rows written
//! before a failure stay valid.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use almanac_core::config::PipelineConfig;
use almanac_db::db::enums::DocumentStatus;
use almanac_db::model::document::{Document, NewDocument};
use almanac_db::model::extracted_event::{ExtractedEvent, NewExtractedEvent};
use almanac_text::{CandidateFilter, normalize_lines};

use crate::error::{ServiceError, ServiceResult};
use crate::extraction::{BatchExtractor, BatchProgress, BatchSink, LineExtraction};
use crate::materialize::materialize;
use crate::storage::ObjectStorage;
use crate::store::{DocumentRepository, ExtractedEventRepository};
use crate::text_extract::TextExtractor;

const PROGRESS_TEXT_EXTRACTED: i16 = 10;
const PROGRESS_FILTERED: i16 = 20;
const PROGRESS_BATCHES_DONE: i16 = 90;

/// Result of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutcome {
    pub events_count: usize,
    pub processing_time_seconds: f64,
}

pub struct Pipeline {
    documents: Arc<dyn DocumentRepository>,
    events: Arc<dyn ExtractedEventRepository>,
    storage: Arc<dyn ObjectStorage>,
    text: Arc<dyn TextExtractor>,
    extractor: BatchExtractor,
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        documents: Arc<dyn DocumentRepository>,
        events: Arc<dyn ExtractedEventRepository>,
        storage: Arc<dyn ObjectStorage>,
        text: Arc<dyn TextExtractor>,
        extractor: BatchExtractor,
        config: PipelineConfig,
    ) -> Self {
        Self {
            documents,
            events,
            storage,
            text,
            extractor,
            config,
        }
    }

    /// ## Summary
    /// Stores the file and records a `pending` document for it.
    ///
    /// The object is keyed `<owner>/<document id>`. If the row cannot be
    /// written the stored object is removed again.
    ///
    /// ## Errors
    /// Returns `InvalidInput` for an empty body, or the storage/database error.
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        owner_id: Uuid,
        file_name: &str,
        media_type: &str,
        bytes: &[u8],
    ) -> ServiceResult<Document> {
        if bytes.is_empty() {
            return Err(ServiceError::InvalidInput("uploaded file is empty".to_string()));
        }
        let byte_size = i64::try_from(bytes.len())
            .map_err(|e| ServiceError::InvalidInput(format!("uploaded file too large: {e}")))?;

        let id = Uuid::now_v7();
        let storage_key = self.storage.upload(&format!("{owner_id}/{id}"), bytes).await?;

        let new_document = NewDocument {
            id,
            owner_id,
            file_name,
            media_type,
            byte_size,
            storage_key: &storage_key,
            status: DocumentStatus::Pending,
            progress: 0,
        };

        match self.documents.insert_document(&new_document).await {
            Ok(document) => {
                tracing::info!(document_id = %document.id, "Document uploaded");
                Ok(document)
            }
            Err(err) => {
                if let Err(cleanup) = self.storage.remove(&storage_key).await {
                    tracing::warn!(storage_key = %storage_key, error = %cleanup, "Failed to remove orphaned upload");
                }
                Err(err)
            }
        }
    }

    /// ## Summary
    /// Deletes the document, its extracted events, and the stored file.
    ///
    /// ## Errors
    /// Returns `NotFound` if the document does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, document_id: Uuid) -> ServiceResult<()> {
        let document = self.find(document_id).await?;

        self.documents.delete_document(document_id).await?;
        self.storage.remove(&document.storage_key).await?;

        tracing::info!("Document deleted");
        Ok(())
    }

    /// ## Summary
    /// Lists an owner's documents, newest first.
    ///
    /// ## Errors
    /// Returns the repository error if the documents cannot be loaded.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, owner_id: Uuid) -> ServiceResult<Vec<Document>> {
        self.documents.list_documents(owner_id).await
    }

    /// ## Summary
    /// Lists the events staged for a document, optionally only those not yet imported.
    ///
    /// ## Errors
    /// Returns `NotFound` if the document does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn extracted_events(
        &self,
        document_id: Uuid,
        pending_only: bool,
    ) -> ServiceResult<Vec<ExtractedEvent>> {
        self.find(document_id).await?;
        self.events.list_extracted(document_id, pending_only).await
    }

    /// ## Summary
    /// Runs extraction for one document and marks it `completed`.
    ///
    /// Failed or malformed batches degrade to zero results without failing
    /// the run. Whole-run failures mark the document `error` with the
    /// message; rows persisted before the failure are kept. Re-running a
    /// document replaces the events an earlier run staged but which were
    /// never imported.
    ///
    /// ## Errors
    /// - `NotFound` if the document or its stored file is missing.
    /// - `Conflict` if another run holds a fresh claim on the document.
    /// - `InvalidInput` if no text can be extracted.
    #[tracing::instrument(skip(self))]
    pub async fn process(&self, document_id: Uuid) -> ServiceResult<ProcessOutcome> {
        let started = Instant::now();
        self.find(document_id).await?;

        let now = Utc::now();
        let Some(document) = self
            .documents
            .claim_document(document_id, now, self.stale_before(now))
            .await?
        else {
            return Err(ServiceError::Conflict(format!(
                "document {document_id} is already being processed"
            )));
        };

        match self.run(&document).await {
            Ok(events_count) => {
                let processing_time_seconds = started.elapsed().as_secs_f64();
                self.documents
                    .complete_document(document_id, processing_time_seconds)
                    .await?;

                tracing::info!(events_count, processing_time_seconds, "Document processed");
                Ok(ProcessOutcome {
                    events_count,
                    processing_time_seconds,
                })
            }
            Err(err) => {
                tracing::warn!(error = %err, "Document processing failed");
                if let Err(mark) = self.documents.fail_document(document_id, &err.to_string()).await {
                    tracing::error!(error = %mark, "Failed to record processing error");
                }
                Err(err)
            }
        }
    }

    async fn run(&self, document: &Document) -> ServiceResult<usize> {
        let bytes = self.storage.download(&document.storage_key).await?;
        let raw = self.text.extract(&document.media_type, &bytes).await?;

        let lines = normalize_lines(&raw);
        if lines.is_empty() {
            return Err(ServiceError::InvalidInput("document contains no text".to_string()));
        }

        let excerpt: String = lines
            .iter()
            .map(|line| line.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
            .chars()
            .take(self.config.excerpt_chars)
            .collect();
        self.documents.set_extracted_text(document.id, &excerpt).await?;
        self.documents
            .advance_progress(document.id, PROGRESS_TEXT_EXTRACTED)
            .await?;

        let candidates = CandidateFilter.retain(lines);
        self.documents.advance_progress(document.id, PROGRESS_FILTERED).await?;
        tracing::debug!(candidates = candidates.len(), "Candidate lines selected");

        let sink = PersistingSink {
            document_id: document.id,
            documents: self.documents.as_ref(),
            events: self.events.as_ref(),
        };
        let summary = self.extractor.run(&candidates, &sink).await?;

        if !summary.failed_batches.is_empty() {
            tracing::warn!(failed_batches = ?summary.failed_batches, "Some extraction batches produced no results");
        }
        Ok(summary.persisted)
    }

    async fn find(&self, document_id: Uuid) -> ServiceResult<Document> {
        self.documents
            .find_document(document_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("document {document_id}")))
    }

    fn stale_before(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let window = i64::try_from(self.config.stale_run_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        now.checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Progress after `progress.batch_index` finished, spread linearly over 20..=90.
fn batch_progress(progress: BatchProgress) -> i16 {
    let span = usize::try_from(PROGRESS_BATCHES_DONE - PROGRESS_FILTERED).unwrap_or(0);
    let done = (progress.batch_index + 1).min(progress.batch_count);
    let step = span * done / progress.batch_count.max(1);
    PROGRESS_FILTERED + i16::try_from(step).unwrap_or(0)
}

/// Materializes and stores each batch as it arrives.
struct PersistingSink<'a> {
    document_id: Uuid,
    documents: &'a dyn DocumentRepository,
    events: &'a dyn ExtractedEventRepository,
}

#[async_trait]
impl BatchSink for PersistingSink<'_> {
    async fn accept(&self, progress: BatchProgress, results: Vec<LineExtraction>) -> ServiceResult<usize> {
        let rows: Vec<NewExtractedEvent> = results
            .iter()
            .filter_map(|result| materialize(self.document_id, result))
            .collect();

        let persisted = self.events.insert_extracted(&rows).await?;
        self.documents
            .advance_progress(self.document_id, batch_progress(progress))
            .await?;

        tracing::debug!(
            document_id = %self.document_id,
            batch_index = progress.batch_index,
            results = results.len(),
            persisted,
            "Batch persisted"
        );
        Ok(persisted)
    }
}
