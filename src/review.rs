//! Human review workflow — queue, detail, and the approve/reject actions
//! that drive the document/extraction state machine.
//!
//! Review actions always operate on the document's current latest extraction
//! and never create a new version: approve may overwrite the latest
//! extraction's payload with corrected data, reject leaves it unchanged.

use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{repository, DatabaseError};
use crate::models::enums::{DocumentKind, DocumentStatus, ReviewState};
use crate::models::{Document, Extraction};
use crate::pipeline::extract::ExtractionResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),

    #[error("No extraction exists for document {0}")]
    InvalidReviewAction(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// One entry in the review queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewQueueItem {
    pub document_id: Uuid,
    pub original_filename: String,
    pub document_type: Option<DocumentKind>,
    pub confidence_score: Option<f32>,
    pub status: DocumentStatus,
}

impl ReviewQueueItem {
    fn from_document(doc: &Document) -> Self {
        Self {
            document_id: doc.id,
            original_filename: doc.original_filename.clone(),
            document_type: doc.document_type,
            confidence_score: doc.confidence_score,
            status: doc.status,
        }
    }
}

/// A document together with its latest extraction, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDetail {
    pub document: Document,
    pub extraction: Option<Extraction>,
}

/// Outcome of an approve or reject action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewActionResult {
    pub document_id: Uuid,
    pub status: DocumentStatus,
    pub review_state: ReviewState,
    /// Unchanged by review actions; reported for audit.
    pub version: i64,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Documents waiting for human review, newest first.
pub fn review_queue(conn: &Connection) -> Result<Vec<ReviewQueueItem>, ReviewError> {
    let documents = repository::get_documents_by_status(conn, DocumentStatus::ReviewRequired)?;
    Ok(documents.iter().map(ReviewQueueItem::from_document).collect())
}

/// A document and its latest extraction. The extraction is `None` for
/// documents no pipeline run has succeeded on yet.
pub fn document_detail(conn: &Connection, document_id: &Uuid) -> Result<DocumentDetail, ReviewError> {
    let document = repository::get_document(conn, document_id)?
        .ok_or(ReviewError::DocumentNotFound(*document_id))?;
    let extraction = repository::latest_extraction(conn, document_id)?;
    Ok(DocumentDetail {
        document,
        extraction,
    })
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Approve the document's latest extraction.
///
/// When the reviewer supplies corrected data it overwrites that same
/// extraction's payload — no new version — and the derived evidence and
/// line-item rows are rebuilt from the corrected payload.
pub fn approve_document(
    conn: &mut Connection,
    document_id: &Uuid,
    replacement: Option<&ExtractionResult>,
) -> Result<ReviewActionResult, ReviewError> {
    apply_review_action(
        conn,
        document_id,
        ReviewState::Approved,
        DocumentStatus::Reviewed,
        replacement,
    )
}

/// Reject the document's latest extraction. The payload is left unchanged.
pub fn reject_document(
    conn: &mut Connection,
    document_id: &Uuid,
) -> Result<ReviewActionResult, ReviewError> {
    apply_review_action(
        conn,
        document_id,
        ReviewState::Rejected,
        DocumentStatus::Rejected,
        None,
    )
}

fn apply_review_action(
    conn: &mut Connection,
    document_id: &Uuid,
    review_state: ReviewState,
    status: DocumentStatus,
    replacement: Option<&ExtractionResult>,
) -> Result<ReviewActionResult, ReviewError> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(DatabaseError::from)?;

    let mut document = repository::get_document(&tx, document_id)?
        .ok_or(ReviewError::DocumentNotFound(*document_id))?;
    let extraction = repository::latest_extraction(&tx, document_id)?
        .ok_or(ReviewError::InvalidReviewAction(*document_id))?;

    if let Some(payload) = replacement {
        repository::replace_extraction_payload(&tx, extraction.id, payload)?;
    }
    repository::update_review_state(&tx, extraction.id, review_state)?;

    document.status = status;
    repository::update_document(&tx, &document)?;

    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(
        document_id = %document_id,
        version = extraction.version,
        review_state = review_state.as_str(),
        status = status.as_str(),
        "Review action applied"
    );

    Ok(ReviewActionResult {
        document_id: *document_id,
        status,
        review_state,
        version: extraction.version,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
