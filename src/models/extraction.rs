use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ReviewState;
use crate::pipeline::extract::ExtractionResult;
use crate::pipeline::ocr::BoundingBox;

/// One immutable extraction version for a document.
///
/// Append-only: a new pipeline run inserts a new row with version =
/// previous max + 1. Review actions mutate `review_state` (and, for an
/// approve with corrections, the payload) but never the version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub id: i64,
    pub document_id: Uuid,
    pub version: i64,
    pub review_state: ReviewState,
    pub payload: ExtractionResult,
    pub created_at: NaiveDateTime,
}

/// Denormalized projection of one (field, evidence) pair.
///
/// Derived data: always reconstructable from the owning extraction's
/// payload; exists only to support row-level querying.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEvidenceRow {
    pub id: i64,
    pub extraction_id: i64,
    pub field_name: String,
    pub field_value: Option<String>,
    pub confidence: f32,
    pub quote: Option<String>,
    pub bbox: Option<BoundingBox>,
    pub page_number: Option<u32>,
}

/// Denormalized projection of one line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemRow {
    pub id: i64,
    pub extraction_id: i64,
    pub row_index: i64,
    pub service: Option<String>,
    pub code: Option<String>,
    pub amount: Option<f64>,
    pub confidence: f32,
    pub evidence_quote: Option<String>,
    pub evidence_bbox: Option<BoundingBox>,
    pub page_number: Option<u32>,
}
