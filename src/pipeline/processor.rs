//! Document processing orchestrator.
//!
//! Single entry point that drives the full pipeline for one document:
//! OCR → extraction → scoring → review decision → versioned persistence.
//!
//! Uses trait-based DI for the recognition engine, PDF renderer, and
//! extraction strategy so the orchestrator remains fully testable with mock
//! implementations.

use std::path::Path;

use rusqlite::{Connection, TransactionBehavior};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::{repository, DatabaseError};
use crate::models::enums::{DocumentStatus, ReviewState};
use crate::models::{Document, Extraction};
use crate::pipeline::extract::{
    run_extraction, ChatCompletionsClient, ExtractError, ExtractionStrategy, LlmExtractor,
    RegexExtractor,
};
use crate::pipeline::ocr::{MockOcrEngine, OcrEngine, OcrError, OcrReader, PdfiumRenderer};
use crate::pipeline::policy::needs_review;
use crate::pipeline::scoring::document_confidence;
use crate::pipeline::snapshot::write_snapshot;

/// Request timeout for the text-generation service.
const LLM_TIMEOUT_SECS: u64 = 300;

// ---------------------------------------------------------------------------
// Error and result types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),

    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),

    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Snapshot write failed: {0}")]
    Snapshot(#[from] std::io::Error),

    #[error("OCR engine initialization failed: {0}")]
    OcrInit(String),
}

/// Explicit outcome of one pipeline run.
///
/// Stage errors never cross this boundary as `Err`: a run that fails inside
/// OCR, extraction, or persistence resolves to `Failed` with the document
/// marked accordingly and no new extraction version. `Err` is reserved for
/// an unknown document id or for the failure record itself not persisting.
#[derive(Debug)]
pub enum RunOutcome {
    Completed {
        document: Document,
        extraction: Extraction,
    },
    Failed {
        document: Document,
        error: String,
    },
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Orchestrates one synchronous unit of work per document submission. All
/// blocking calls (OCR, optional network call) run strictly in sequence.
pub struct DocumentProcessor {
    reader: OcrReader,
    strategy: Box<dyn ExtractionStrategy + Send + Sync>,
    config: AppConfig,
}

impl DocumentProcessor {
    pub fn new(
        reader: OcrReader,
        strategy: Box<dyn ExtractionStrategy + Send + Sync>,
        config: AppConfig,
    ) -> Self {
        Self {
            reader,
            strategy,
            config,
        }
    }

    /// Run the full pipeline for one stored document.
    ///
    /// On success: exactly one new Extraction (version = previous max + 1)
    /// with review_state `pending` when review is required and `approved`
    /// otherwise; the document moves to `review_required` or `processed`
    /// and any prior error message is cleared. The extraction row, its
    /// projection rows, the document update, and both latest-state
    /// snapshots commit as one unit.
    ///
    /// On a stage failure: the document is marked `failed` with the error
    /// text, no new Extraction is created, and previously committed
    /// versions are untouched.
    pub fn process_document(
        &self,
        conn: &mut Connection,
        document_id: &Uuid,
    ) -> Result<RunOutcome, PipelineError> {
        let mut document = repository::get_document(conn, document_id)?
            .ok_or(PipelineError::DocumentNotFound(*document_id))?;

        tracing::info!(
            document_id = %document_id,
            filename = %document.original_filename,
            "Pipeline run starting"
        );

        match self.run_stages(conn, &mut document) {
            Ok(extraction) => {
                tracing::info!(
                    document_id = %document_id,
                    version = extraction.version,
                    status = document.status.as_str(),
                    confidence = document.confidence_score,
                    "Pipeline run complete"
                );
                Ok(RunOutcome::Completed {
                    document,
                    extraction,
                })
            }
            Err(e) => {
                let error = e.to_string();
                tracing::warn!(
                    document_id = %document_id,
                    error = %error,
                    "Pipeline run failed"
                );
                document.status = DocumentStatus::Failed;
                document.error_message = Some(error.clone());
                repository::update_document(conn, &document)?;
                Ok(RunOutcome::Failed { document, error })
            }
        }
    }

    fn run_stages(
        &self,
        conn: &mut Connection,
        document: &mut Document,
    ) -> Result<Extraction, PipelineError> {
        let ocr_result = self.reader.run_ocr(Path::new(&document.file_path))?;
        let extraction_result = run_extraction(self.strategy.as_ref(), &ocr_result)?;

        let confidence = document_confidence(&extraction_result);
        let review = needs_review(
            &extraction_result,
            confidence,
            self.config.confidence_threshold,
        );

        document.document_type = Some(extraction_result.document_type);
        document.confidence_score = Some(confidence);
        document.status = if review {
            DocumentStatus::ReviewRequired
        } else {
            DocumentStatus::Processed
        };
        document.error_message = None;

        let review_state = if review {
            ReviewState::Pending
        } else {
            ReviewState::Approved
        };

        // Version allocation must be race-free under concurrent re-processing
        // of the same document id: the IMMEDIATE transaction holds the write
        // lock across the max-version read and the insert.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DatabaseError::from)?;
        let version = repository::next_extraction_version(&tx, &document.id)?;
        let extraction =
            repository::insert_extraction(&tx, &document.id, version, review_state, &extraction_result)?;
        repository::update_document(&tx, document)?;
        write_snapshot(&self.config.ocr_snapshot_dir, &document.id, &ocr_result)?;
        write_snapshot(
            &self.config.extraction_snapshot_dir,
            &document.id,
            &extraction_result,
        )?;
        tx.commit().map_err(DatabaseError::from)?;

        Ok(extraction)
    }
}

// ---------------------------------------------------------------------------
// Factory
// ---------------------------------------------------------------------------

/// Build a `DocumentProcessor` with production implementations.
///
/// The extraction strategy is chosen here, once, from credential presence:
/// a configured language-model key selects the LLM strategy, otherwise the
/// regex fallback runs and no external call is ever made.
pub fn build_processor(config: &AppConfig) -> Result<DocumentProcessor, PipelineError> {
    let engine = build_ocr_engine()?;
    let pdf = PdfiumRenderer::new().map_err(|e| PipelineError::OcrInit(e.to_string()))?;
    let reader = OcrReader::new(engine, Box::new(pdf));

    let strategy: Box<dyn ExtractionStrategy + Send + Sync> = match &config.llm_api_key {
        Some(key) => {
            tracing::info!(model = %config.llm_model, "Using language-model extraction strategy");
            let client = ChatCompletionsClient::new(
                &config.llm_api_base_url,
                key,
                &config.llm_model,
                LLM_TIMEOUT_SECS,
            );
            Box::new(LlmExtractor::new(Box::new(client)))
        }
        None => {
            tracing::info!("No language-model credential configured — using regex fallback");
            Box::new(RegexExtractor::new())
        }
    };

    Ok(DocumentProcessor::new(reader, strategy, config.clone()))
}

/// Build the recognition engine, respecting feature flags.
fn build_ocr_engine() -> Result<Box<dyn OcrEngine + Send + Sync>, PipelineError> {
    #[cfg(feature = "ocr")]
    {
        if let Ok(tessdata) = find_tessdata_dir() {
            let engine = crate::pipeline::ocr::TesseractEngine::new(&tessdata)
                .map_err(|e| PipelineError::OcrInit(e.to_string()))?;
            tracing::info!(tessdata = %tessdata.display(), "Tesseract OCR initialized");
            return Ok(Box::new(engine));
        }
        tracing::warn!("Tesseract data not found — word recognition unavailable");
    }

    tracing::info!("Using placeholder OCR engine — word recognition unavailable");
    Ok(Box::new(MockOcrEngine::new("", 0.0)))
}

/// Locate the tessdata directory from the environment or system paths.
#[cfg(feature = "ocr")]
fn find_tessdata_dir() -> Result<std::path::PathBuf, PipelineError> {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("TESSDATA_PREFIX") {
        let p = PathBuf::from(&path);
        if p.join("eng.traineddata").exists() {
            return Ok(p);
        }
    }

    let candidates = [
        "/usr/share/tesseract-ocr/5/tessdata",
        "/usr/share/tesseract-ocr/4.00/tessdata",
        "/usr/share/tessdata",
        "/usr/local/share/tessdata",
        "/opt/homebrew/share/tessdata",
    ];

    for path in &candidates {
        let p = PathBuf::from(path);
        if p.join("eng.traineddata").exists() {
            return Ok(p);
        }
    }

    Err(PipelineError::OcrInit(
        "Tesseract data directory not found. Set TESSDATA_PREFIX or install tesseract-ocr-eng"
            .into(),
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
