//! Upload boundary: accepts raw file bytes plus a declared filename,
//! rejects unrecognized kinds before the pipeline ever runs, stores the
//! original, and registers the document row.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::{repository, DatabaseError};
use crate::models::Document;

/// File kinds the pipeline recognizes.
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg"];

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Store an uploaded file and create its document row (status `uploaded`).
///
/// Unrecognized extensions are rejected with nothing persisted. The stored
/// copy is named by the new document's id so re-uploads of the same
/// filename never collide.
pub fn register_document(
    conn: &Connection,
    config: &AppConfig,
    bytes: &[u8],
    original_filename: &str,
    content_type: &str,
) -> Result<Document, IntakeError> {
    let extension = file_extension(original_filename);
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(IntakeError::UnsupportedFormat(extension));
    }

    let id = Uuid::new_v4();
    let stored_path = upload_path(&config.upload_dir, &id, &extension);
    std::fs::create_dir_all(&config.upload_dir)?;
    std::fs::write(&stored_path, bytes)?;

    let mut document = Document::new(
        original_filename,
        content_type,
        &stored_path.to_string_lossy(),
    );
    document.id = id;
    repository::insert_document(conn, &document)?;

    tracing::info!(
        document_id = %document.id,
        filename = %original_filename,
        bytes = bytes.len(),
        "Document registered"
    );

    Ok(document)
}

fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

fn upload_path(dir: &Path, id: &Uuid, extension: &str) -> PathBuf {
    dir.join(format!("{id}.{extension}"))
}
