//! Record assembly and batch entry points.
//!
//! [`StatementExtractor`] runs the pipeline for one document at a time and
//! turns every outcome into exactly one [`ExtractedRecord`]. Per-document
//! failures never escape as `Err`; only setup problems (bad config, HTTP
//! client cannot be built, temp file cannot be written) are fatal.

use crate::config::ExtractionConfig;
use crate::error::{DocumentError, StatementError};
use crate::output::ExtractedRecord;
use crate::pipeline::input::{Document, SpooledDocument};
use crate::pipeline::llm::{GenerationBackend, OllamaClient};
use crate::pipeline::prompt::build_prompt;
use crate::pipeline::text::{PdfiumTextExtractor, TextExtractor};
use crate::pipeline::validate::{validate, Validated};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Runs the extraction pipeline with a fixed configuration.
///
/// Holds no per-document state: processing the same documents in any order
/// yields the same records.
#[derive(Clone)]
pub struct StatementExtractor {
    config: ExtractionConfig,
    text: Arc<dyn TextExtractor>,
    backend: Arc<dyn GenerationBackend>,
}

impl StatementExtractor {
    /// pdfium for text, the configured HTTP endpoint for generation.
    pub fn new(config: ExtractionConfig) -> Result<Self, StatementError> {
        let backend = OllamaClient::new(&config)?;
        let text = PdfiumTextExtractor::new(config.page_policy, config.pdfium_lib_path.clone());
        Ok(Self::with_parts(config, Arc::new(text), Arc::new(backend)))
    }

    /// Assemble from explicit stages, e.g. to point at a different service.
    pub fn with_parts(
        config: ExtractionConfig,
        text: Arc<dyn TextExtractor>,
        backend: Arc<dyn GenerationBackend>,
    ) -> Self {
        Self {
            config,
            text,
            backend,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Header text of the PDF at `path`; empty when nothing is extractable.
    pub async fn extract_text(&self, path: &Path) -> String {
        let text = Arc::clone(&self.text);
        let path = path.to_path_buf();
        match tokio::task::spawn_blocking(move || text.extract_text(&path)).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Text extraction task panicked: {}", e);
                String::new()
            }
        }
    }

    /// Run prompt → model → validation on already-extracted text.
    ///
    /// Whitespace-only text short-circuits before any model call.
    pub async fn parse_text(&self, text: &str) -> Result<Validated, DocumentError> {
        if text.trim().is_empty() {
            return Err(DocumentError::EmptyText);
        }

        let prompt = build_prompt(text, &self.config);
        debug!(
            "Prompt: {} chars for model {}",
            prompt.prompt.chars().count(),
            prompt.options.model
        );

        let raw = self.backend.generate(&prompt).await?;
        validate(&raw, text)
    }

    /// Produce the record for `text` under `filename`.
    pub async fn record_for_text(&self, filename: &str, text: &str) -> ExtractedRecord {
        match self.parse_text(text).await {
            Ok(validated) => {
                for w in &validated.warnings {
                    warn!("{}: {}", filename, w);
                }
                ExtractedRecord::success(filename, validated.fields)
            }
            Err(e) => {
                warn!("{}: {} ({})", filename, e, e.kind());
                ExtractedRecord::failure(filename, &e)
            }
        }
    }

    /// Extract one document. Always returns a record.
    pub async fn extract_document(&self, document: &Document) -> ExtractedRecord {
        let start = Instant::now();
        let text = self.extract_text(&document.path).await;
        debug!(
            "{}: {} chars of header text",
            document.filename,
            text.chars().count()
        );

        let record = self.record_for_text(&document.filename, &text).await;
        info!(
            "{}: {} in {}ms",
            document.filename,
            if record.is_success() { "extracted" } else { "failed" },
            start.elapsed().as_millis()
        );
        record
    }

    /// Extract uploaded bytes, spooled to a temp file removed afterwards.
    pub async fn extract_bytes(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<ExtractedRecord, StatementError> {
        let spooled = SpooledDocument::spool(filename, bytes)?;
        Ok(self.extract_document(spooled.document()).await)
        // `spooled` is dropped (and the file deleted) here
    }

    /// Extract every document in order, one at a time.
    ///
    /// The result has exactly one record per input, in input order.
    pub async fn extract_batch(&self, documents: &[Document]) -> Vec<ExtractedRecord> {
        let total = documents.len();
        info!("Starting batch of {} statements", total);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_start(total);
        }

        let mut records = Vec::with_capacity(total);
        for (index, document) in documents.iter().enumerate() {
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_document_start(index, total, &document.filename);
            }

            let record = self.extract_document(document).await;

            if let Some(ref cb) = self.config.progress_callback {
                match record.failure_record() {
                    None => cb.on_document_complete(index, total, &document.filename),
                    Some(f) => cb.on_document_error(index, total, &document.filename, &f.message),
                }
            }
            records.push(record);
        }

        let succeeded = records.iter().filter(|r| r.is_success()).count();
        info!("Batch complete: {}/{} statements extracted", succeeded, total);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_batch_complete(total, succeeded);
        }
        records
    }

    /// Synchronous wrapper around [`Self::extract_batch`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from
    /// within an async context.
    pub fn extract_batch_sync(
        &self,
        documents: &[Document],
    ) -> Result<Vec<ExtractedRecord>, StatementError> {
        Ok(runtime()?.block_on(self.extract_batch(documents)))
    }
}

/// Extract a batch of statements with the default pdfium + HTTP stages.
pub async fn extract_statements(
    documents: &[Document],
    config: &ExtractionConfig,
) -> Result<Vec<ExtractedRecord>, StatementError> {
    let extractor = StatementExtractor::new(config.clone())?;
    Ok(extractor.extract_batch(documents).await)
}

/// Synchronous wrapper around [`extract_statements`].
pub fn extract_statements_sync(
    documents: &[Document],
    config: &ExtractionConfig,
) -> Result<Vec<ExtractedRecord>, StatementError> {
    runtime()?.block_on(extract_statements(documents, config))
}

fn runtime() -> Result<tokio::runtime::Runtime, StatementError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| StatementError::Internal(format!("Failed to create tokio runtime: {}", e)))
}
