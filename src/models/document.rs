use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{DocumentKind, DocumentStatus};

/// One row per uploaded file. Mutated in place by pipeline runs and review
/// actions; never deleted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub original_filename: String,
    pub content_type: String,
    pub file_path: String,
    pub status: DocumentStatus,
    pub document_type: Option<DocumentKind>,
    pub confidence_score: Option<f32>,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Document {
    /// A freshly uploaded document, before any pipeline run.
    pub fn new(original_filename: &str, content_type: &str, file_path: &str) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            original_filename: original_filename.to_string(),
            content_type: content_type.to_string(),
            file_path: file_path.to_string(),
            status: DocumentStatus::Uploaded,
            document_type: None,
            confidence_score: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_starts_uploaded() {
        let doc = Document::new("claim.pdf", "application/pdf", "/tmp/abc.pdf");
        assert_eq!(doc.status, DocumentStatus::Uploaded);
        assert!(doc.document_type.is_none());
        assert!(doc.confidence_score.is_none());
        assert!(doc.error_message.is_none());
        assert_eq!(doc.created_at, doc.updated_at);
    }
}
