use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::ReviewState;
use crate::models::{Extraction, FieldEvidenceRow, LineItemRow};
use crate::pipeline::extract::{ExtractionResult, FieldValue};
use crate::pipeline::ocr::BoundingBox;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Version the next pipeline run should use for this document.
///
/// Callers that insert must hold a write transaction across this read and
/// the subsequent `insert_extraction`, otherwise concurrent runs can race
/// to the same version.
pub fn next_extraction_version(conn: &Connection, document_id: &Uuid) -> Result<i64, DatabaseError> {
    let current: Option<i64> = conn.query_row(
        "SELECT MAX(version) FROM extractions WHERE document_id = ?1",
        params![document_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(current.unwrap_or(0) + 1)
}

/// Insert a new extraction version together with its derived evidence and
/// line-item projection rows. Returns the stored row including its id.
pub fn insert_extraction(
    conn: &Connection,
    document_id: &Uuid,
    version: i64,
    review_state: ReviewState,
    payload: &ExtractionResult,
) -> Result<Extraction, DatabaseError> {
    let created_at = chrono::Utc::now().naive_utc();
    let data = serde_json::to_string(payload)
        .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

    conn.execute(
        "INSERT INTO extractions (document_id, version, review_state, extraction_data, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            document_id.to_string(),
            version,
            review_state.as_str(),
            data,
            created_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    let id = conn.last_insert_rowid();

    project_rows(conn, id, payload)?;

    Ok(Extraction {
        id,
        document_id: *document_id,
        version,
        review_state,
        payload: payload.clone(),
        created_at,
    })
}

/// Latest extraction for a document: highest version, ties broken by the
/// highest row id (most recently inserted).
pub fn latest_extraction(
    conn: &Connection,
    document_id: &Uuid,
) -> Result<Option<Extraction>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, document_id, version, review_state, extraction_data, created_at
         FROM extractions WHERE document_id = ?1
         ORDER BY version DESC, id DESC LIMIT 1",
    )?;

    let result = stmt.query_row(params![document_id.to_string()], row_to_extraction_row);

    match result {
        Ok(row) => Ok(Some(extraction_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All extraction versions for a document, oldest first.
pub fn list_extractions(
    conn: &Connection,
    document_id: &Uuid,
) -> Result<Vec<Extraction>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, document_id, version, review_state, extraction_data, created_at
         FROM extractions WHERE document_id = ?1 ORDER BY version ASC, id ASC",
    )?;

    let rows = stmt.query_map(params![document_id.to_string()], row_to_extraction_row)?;

    let mut extractions = Vec::new();
    for row in rows {
        extractions.push(extraction_from_row(row?)?);
    }
    Ok(extractions)
}

/// Update the review state of one extraction row.
pub fn update_review_state(
    conn: &Connection,
    extraction_id: i64,
    state: ReviewState,
) -> Result<(), DatabaseError> {
    let rows = conn.execute(
        "UPDATE extractions SET review_state = ?2 WHERE id = ?1",
        params![extraction_id, state.as_str()],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Extraction".into(),
            id: extraction_id.to_string(),
        });
    }
    Ok(())
}

/// Overwrite an extraction's payload in place (no new version) and rebuild
/// its projection rows so they stay derivable from the payload.
pub fn replace_extraction_payload(
    conn: &Connection,
    extraction_id: i64,
    payload: &ExtractionResult,
) -> Result<(), DatabaseError> {
    let data = serde_json::to_string(payload)
        .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

    let rows = conn.execute(
        "UPDATE extractions SET extraction_data = ?2 WHERE id = ?1",
        params![extraction_id, data],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Extraction".into(),
            id: extraction_id.to_string(),
        });
    }

    conn.execute(
        "DELETE FROM field_evidences WHERE extraction_id = ?1",
        params![extraction_id],
    )?;
    conn.execute(
        "DELETE FROM line_items WHERE extraction_id = ?1",
        params![extraction_id],
    )?;
    project_rows(conn, extraction_id, payload)?;

    Ok(())
}

/// Field evidence projection rows for one extraction, in insertion order.
pub fn field_evidence_rows(
    conn: &Connection,
    extraction_id: i64,
) -> Result<Vec<FieldEvidenceRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, extraction_id, field_name, field_value, confidence, quote, bbox, page_number
         FROM field_evidences WHERE extraction_id = ?1 ORDER BY id ASC",
    )?;

    let rows = stmt.query_map(params![extraction_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, f32>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, Option<u32>>(7)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (id, extraction_id, field_name, field_value, confidence, quote, bbox, page_number) =
            row?;
        out.push(FieldEvidenceRow {
            id,
            extraction_id,
            field_name,
            field_value,
            confidence,
            quote,
            bbox: parse_bbox(bbox)?,
            page_number,
        });
    }
    Ok(out)
}

/// Line item projection rows for one extraction, ordered by row index.
pub fn line_item_rows(
    conn: &Connection,
    extraction_id: i64,
) -> Result<Vec<LineItemRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, extraction_id, row_index, service, code, amount, confidence,
         evidence_quote, evidence_bbox, page_number
         FROM line_items WHERE extraction_id = ?1 ORDER BY row_index ASC",
    )?;

    let rows = stmt.query_map(params![extraction_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<f64>>(5)?,
            row.get::<_, f32>(6)?,
            row.get::<_, Option<String>>(7)?,
            row.get::<_, Option<String>>(8)?,
            row.get::<_, Option<u32>>(9)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (
            id,
            extraction_id,
            row_index,
            service,
            code,
            amount,
            confidence,
            evidence_quote,
            evidence_bbox,
            page_number,
        ) = row?;
        out.push(LineItemRow {
            id,
            extraction_id,
            row_index,
            service,
            code,
            amount,
            confidence,
            evidence_quote,
            evidence_bbox: parse_bbox(evidence_bbox)?,
            page_number,
        });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Write the denormalized per-field and per-line-item rows for a payload.
/// Fields without evidence still get one row so every field is queryable.
fn project_rows(
    conn: &Connection,
    extraction_id: i64,
    payload: &ExtractionResult,
) -> Result<(), DatabaseError> {
    for (field_name, field) in &payload.fields {
        let field_value = field.value.as_ref().map(field_value_to_string);
        if field.evidence.is_empty() {
            insert_field_evidence(
                conn,
                extraction_id,
                field_name,
                field_value.as_deref(),
                field.confidence,
                None,
                None,
                None,
            )?;
        } else {
            for ev in &field.evidence {
                insert_field_evidence(
                    conn,
                    extraction_id,
                    field_name,
                    field_value.as_deref(),
                    field.confidence,
                    ev.quote.as_deref(),
                    ev.bbox.as_ref(),
                    ev.page_number,
                )?;
            }
        }
    }

    for (idx, item) in payload.line_items.iter().enumerate() {
        let ev = item.evidence.first();
        let bbox = ev
            .and_then(|e| e.bbox.as_ref())
            .map(serialize_bbox)
            .transpose()?;
        conn.execute(
            "INSERT INTO line_items (extraction_id, row_index, service, code, amount,
             confidence, evidence_quote, evidence_bbox, page_number)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                extraction_id,
                idx as i64,
                item.service,
                item.code,
                item.amount,
                item.confidence,
                ev.and_then(|e| e.quote.as_deref()),
                bbox,
                ev.and_then(|e| e.page_number),
            ],
        )?;
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn insert_field_evidence(
    conn: &Connection,
    extraction_id: i64,
    field_name: &str,
    field_value: Option<&str>,
    confidence: f32,
    quote: Option<&str>,
    bbox: Option<&BoundingBox>,
    page_number: Option<u32>,
) -> Result<(), DatabaseError> {
    let bbox = bbox.map(serialize_bbox).transpose()?;
    conn.execute(
        "INSERT INTO field_evidences (extraction_id, field_name, field_value, confidence,
         quote, bbox, page_number)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            extraction_id,
            field_name,
            field_value,
            confidence,
            quote,
            bbox,
            page_number,
        ],
    )?;
    Ok(())
}

fn field_value_to_string(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Number(n) => format!("{n}"),
    }
}

fn serialize_bbox(bbox: &BoundingBox) -> Result<String, DatabaseError> {
    serde_json::to_string(bbox).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

fn parse_bbox(raw: Option<String>) -> Result<Option<BoundingBox>, DatabaseError> {
    raw.map(|s| {
        serde_json::from_str(&s).map_err(|e| DatabaseError::Serialization(e.to_string()))
    })
    .transpose()
}

// Internal row type for Extraction mapping
struct ExtractionRow {
    id: i64,
    document_id: String,
    version: i64,
    review_state: String,
    extraction_data: String,
    created_at: String,
}

fn row_to_extraction_row(row: &rusqlite::Row<'_>) -> Result<ExtractionRow, rusqlite::Error> {
    Ok(ExtractionRow {
        id: row.get::<_, i64>(0)?,
        document_id: row.get::<_, String>(1)?,
        version: row.get::<_, i64>(2)?,
        review_state: row.get::<_, String>(3)?,
        extraction_data: row.get::<_, String>(4)?,
        created_at: row.get::<_, String>(5)?,
    })
}

fn extraction_from_row(row: ExtractionRow) -> Result<Extraction, DatabaseError> {
    Ok(Extraction {
        id: row.id,
        document_id: Uuid::parse_str(&row.document_id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        version: row.version,
        review_state: ReviewState::from_str(&row.review_state)?,
        payload: serde_json::from_str(&row.extraction_data)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?,
        created_at: NaiveDateTime::parse_from_str(&row.created_at, TIMESTAMP_FORMAT)
            .unwrap_or_default(),
    })
}
