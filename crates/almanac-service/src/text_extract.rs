//! Turning downloaded document bytes into text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use almanac_core::config::OcrConfig;

use crate::error::{ServiceError, ServiceResult};

/// Extracts plain text from a stored document.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// ## Errors
    /// Returns `InvalidInput` for media types the extractor cannot handle.
    async fn extract(&self, media_type: &str, bytes: &[u8]) -> ServiceResult<String>;
}

/// Returns `true` for media types that are already text.
#[must_use]
pub fn is_plain_text(media_type: &str) -> bool {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence.starts_with("text/")
}

/// Returns `true` for PDF media types.
#[must_use]
pub fn is_pdf(media_type: &str) -> bool {
    media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .eq_ignore_ascii_case("application/pdf")
}

/// Reads the text layer of a PDF.
///
/// `pdf_extract` can panic on malformed input, so decoding runs on the
/// blocking pool behind `catch_unwind`.
///
/// ## Errors
/// Returns `InvalidInput` if the PDF cannot be parsed.
pub async fn pdf_text(bytes: &[u8]) -> ServiceResult<String> {
    let bytes = bytes.to_vec();
    let decoded = tokio::task::spawn_blocking(move || {
        std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
    })
    .await
    .map_err(|e| ServiceError::InvalidInput(format!("PDF decoding task failed: {e}")))?;

    match decoded {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ServiceError::InvalidInput(format!("PDF extraction failed: {e}"))),
        Err(_) => Err(ServiceError::InvalidInput("PDF extraction panicked (malformed PDF)".to_string())),
    }
}

/// Sends non-text documents to a remote OCR endpoint.
///
/// The endpoint receives the raw bytes with their `Content-Type` and answers
/// with `{"text": "..."}`.
pub struct RemoteOcrExtractor {
    client: Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    #[serde(default)]
    text: String,
}

impl RemoteOcrExtractor {
    /// ## Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &OcrConfig, timeout: Duration) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::InvalidInput(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl TextExtractor for RemoteOcrExtractor {
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn extract(&self, media_type: &str, bytes: &[u8]) -> ServiceResult<String> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, media_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| ServiceError::StorageError(format!("OCR request failed: {e}")))?;

        let status = response.status();
        if status.is_client_error() {
            return Err(ServiceError::InvalidInput(format!(
                "OCR service rejected {media_type}: {status}"
            )));
        }
        if !status.is_success() {
            return Err(ServiceError::StorageError(format!("OCR service returned {status}")));
        }

        let body: OcrResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::StorageError(format!("OCR response unreadable: {e}")))?;
        Ok(body.text)
    }
}

/// Decodes text media and PDF text layers locally and hands everything else
/// to OCR, if configured.
///
/// A PDF that fails to parse or has no text layer (a scan) also goes to OCR.
pub struct DocumentTextExtractor {
    ocr: Option<Box<dyn TextExtractor>>,
}

impl DocumentTextExtractor {
    #[must_use]
    pub fn new(ocr: Option<Box<dyn TextExtractor>>) -> Self {
        Self { ocr }
    }
}

#[async_trait]
impl TextExtractor for DocumentTextExtractor {
    async fn extract(&self, media_type: &str, bytes: &[u8]) -> ServiceResult<String> {
        if is_plain_text(media_type) {
            return Ok(String::from_utf8_lossy(bytes).into_owned());
        }

        let local_failure = if is_pdf(media_type) {
            match pdf_text(bytes).await {
                Ok(text) if !text.trim().is_empty() => {
                    tracing::debug!(chars = text.len(), "PDF text layer extracted");
                    return Ok(text);
                }
                Ok(_) => ServiceError::InvalidInput("PDF has no text layer and OCR is not configured".to_string()),
                Err(err) => {
                    tracing::debug!(error = %err, "PDF text layer unreadable, trying OCR");
                    err
                }
            }
        } else {
            ServiceError::InvalidInput(format!("unsupported media type without OCR: {media_type}"))
        };

        match &self.ocr {
            Some(ocr) => ocr.extract(media_type, bytes).await,
            None => Err(local_failure),
        }
    }
}
