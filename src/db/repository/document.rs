use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{DocumentKind, DocumentStatus};
use crate::models::Document;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn insert_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO documents (id, original_filename, content_type, file_path, status,
         document_type, confidence_score, error_message, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            doc.id.to_string(),
            doc.original_filename,
            doc.content_type,
            doc.file_path,
            doc.status.as_str(),
            doc.document_type.map(|t| t.as_str()),
            doc.confidence_score,
            doc.error_message,
            doc.created_at.format(TIMESTAMP_FORMAT).to_string(),
            doc.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_document(conn: &Connection, id: &Uuid) -> Result<Option<Document>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, original_filename, content_type, file_path, status,
         document_type, confidence_score, error_message, created_at, updated_at
         FROM documents WHERE id = ?1",
    )?;

    let result = stmt.query_row(params![id.to_string()], row_to_document_row);

    match result {
        Ok(row) => Ok(Some(document_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Update the mutable portion of a document row. `updated_at` is refreshed
/// here, not by the caller.
pub fn update_document(conn: &Connection, doc: &Document) -> Result<(), DatabaseError> {
    let updated_at = chrono::Utc::now().naive_utc();
    let rows = conn.execute(
        "UPDATE documents SET status = ?2, document_type = ?3, confidence_score = ?4,
         error_message = ?5, updated_at = ?6
         WHERE id = ?1",
        params![
            doc.id.to_string(),
            doc.status.as_str(),
            doc.document_type.map(|t| t.as_str()),
            doc.confidence_score,
            doc.error_message,
            updated_at.format(TIMESTAMP_FORMAT).to_string(),
        ],
    )?;
    if rows == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Document".into(),
            id: doc.id.to_string(),
        });
    }
    Ok(())
}

/// All documents, newest first.
pub fn list_documents(conn: &Connection) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, original_filename, content_type, file_path, status,
         document_type, confidence_score, error_message, created_at, updated_at
         FROM documents ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt.query_map([], row_to_document_row)?;

    let mut docs = Vec::new();
    for row in rows {
        docs.push(document_from_row(row?)?);
    }
    Ok(docs)
}

/// All documents matching a status, newest first.
pub fn get_documents_by_status(
    conn: &Connection,
    status: DocumentStatus,
) -> Result<Vec<Document>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, original_filename, content_type, file_path, status,
         document_type, confidence_score, error_message, created_at, updated_at
         FROM documents WHERE status = ?1 ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt.query_map(params![status.as_str()], row_to_document_row)?;

    let mut docs = Vec::new();
    for row in rows {
        docs.push(document_from_row(row?)?);
    }
    Ok(docs)
}

// Internal row type for Document mapping
struct DocumentRow {
    id: String,
    original_filename: String,
    content_type: String,
    file_path: String,
    status: String,
    document_type: Option<String>,
    confidence_score: Option<f32>,
    error_message: Option<String>,
    created_at: String,
    updated_at: String,
}

fn row_to_document_row(row: &rusqlite::Row<'_>) -> Result<DocumentRow, rusqlite::Error> {
    Ok(DocumentRow {
        id: row.get::<_, String>(0)?,
        original_filename: row.get::<_, String>(1)?,
        content_type: row.get::<_, String>(2)?,
        file_path: row.get::<_, String>(3)?,
        status: row.get::<_, String>(4)?,
        document_type: row.get::<_, Option<String>>(5)?,
        confidence_score: row.get::<_, Option<f32>>(6)?,
        error_message: row.get::<_, Option<String>>(7)?,
        created_at: row.get::<_, String>(8)?,
        updated_at: row.get::<_, String>(9)?,
    })
}

fn document_from_row(row: DocumentRow) -> Result<Document, DatabaseError> {
    Ok(Document {
        id: Uuid::parse_str(&row.id)
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        original_filename: row.original_filename,
        content_type: row.content_type,
        file_path: row.file_path,
        status: DocumentStatus::from_str(&row.status)?,
        document_type: row
            .document_type
            .as_deref()
            .map(DocumentKind::from_str)
            .transpose()?,
        confidence_score: row.confidence_score,
        error_message: row.error_message,
        created_at: parse_timestamp(&row.created_at),
        updated_at: parse_timestamp(&row.updated_at),
    })
}

fn parse_timestamp(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn sample_document() -> Document {
        Document::new("claim.pdf", "application/pdf", "/tmp/claim.pdf")
    }

    #[test]
    fn insert_and_get_round_trip() {
        let conn = open_memory_database().unwrap();
        let doc = sample_document();
        insert_document(&conn, &doc).unwrap();

        let loaded = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(loaded.id, doc.id);
        assert_eq!(loaded.original_filename, "claim.pdf");
        assert_eq!(loaded.status, DocumentStatus::Uploaded);
        assert!(loaded.document_type.is_none());
    }

    #[test]
    fn get_missing_document_returns_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_document(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn update_persists_status_and_type() {
        let conn = open_memory_database().unwrap();
        let mut doc = sample_document();
        insert_document(&conn, &doc).unwrap();

        doc.status = DocumentStatus::Processed;
        doc.document_type = Some(DocumentKind::InsuranceClaim);
        doc.confidence_score = Some(0.91);
        update_document(&conn, &doc).unwrap();

        let loaded = get_document(&conn, &doc.id).unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Processed);
        assert_eq!(loaded.document_type, Some(DocumentKind::InsuranceClaim));
        assert!((loaded.confidence_score.unwrap() - 0.91).abs() < 1e-6);
    }

    #[test]
    fn update_missing_document_is_not_found() {
        let conn = open_memory_database().unwrap();
        let doc = sample_document();
        let result = update_document(&conn, &doc);
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn filter_by_status() {
        let conn = open_memory_database().unwrap();
        let mut a = sample_document();
        insert_document(&conn, &a).unwrap();
        a.status = DocumentStatus::ReviewRequired;
        update_document(&conn, &a).unwrap();

        let b = sample_document();
        insert_document(&conn, &b).unwrap();

        let queue = get_documents_by_status(&conn, DocumentStatus::ReviewRequired).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].id, a.id);

        assert_eq!(list_documents(&conn).unwrap().len(), 2);
    }
}
