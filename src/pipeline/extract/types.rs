use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::enums::DocumentKind;
use crate::pipeline::ocr::BoundingBox;

/// A quote tying an extracted value back to the source document, with the
/// matched word's position when one could be anchored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEvidence {
    pub quote: Option<String>,
    pub bbox: Option<BoundingBox>,
    pub page_number: Option<u32>,
}

impl SourceEvidence {
    pub fn quote_only(quote: &str) -> Self {
        Self {
            quote: Some(quote.to_string()),
            bbox: None,
            page_number: None,
        }
    }
}

/// Extracted field values are either free text or a parsed number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Absent-equivalent: an empty string carries no value.
    pub fn is_empty(&self) -> bool {
        matches!(self, FieldValue::Text(s) if s.is_empty())
    }
}

/// One extracted field with its confidence and supporting evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField {
    pub value: Option<FieldValue>,
    pub confidence: f32,
    #[serde(default)]
    pub evidence: Vec<SourceEvidence>,
}

impl ExtractedField {
    /// The back-fill placeholder for a required field no strategy resolved.
    pub fn unresolved() -> Self {
        Self {
            value: None,
            confidence: 0.0,
            evidence: vec![],
        }
    }

    pub fn has_value(&self) -> bool {
        self.value.as_ref().is_some_and(|v| !v.is_empty())
    }
}

/// One extracted billing line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemExtraction {
    pub service: Option<String>,
    pub code: Option<String>,
    pub amount: Option<f64>,
    pub confidence: f32,
    #[serde(default)]
    pub evidence: Vec<SourceEvidence>,
}

/// The unit that gets persisted: one strategy's full output for a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub document_type: DocumentKind,
    pub fields: BTreeMap<String, ExtractedField>,
    pub line_items: Vec<LineItemExtraction>,
    /// Raw strategy output retained for audit.
    pub raw_response: serde_json::Value,
}

/// One of the two interchangeable extraction strategies. Selected once per
/// pipeline run from credential presence, never per field.
pub trait ExtractionStrategy {
    fn extract(&self, ocr: &crate::pipeline::ocr::OcrResult)
        -> Result<ExtractionResult, super::ExtractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_value_serializes_untagged() {
        let text = serde_json::to_string(&FieldValue::Text("CLM-1".into())).unwrap();
        assert_eq!(text, "\"CLM-1\"");
        let number = serde_json::to_string(&FieldValue::Number(1200.0)).unwrap();
        assert_eq!(number, "1200.0");
    }

    #[test]
    fn field_value_deserializes_by_json_type() {
        let text: FieldValue = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(text, FieldValue::Text("abc".into()));
        let number: FieldValue = serde_json::from_str("42.5").unwrap();
        assert_eq!(number, FieldValue::Number(42.5));
    }

    #[test]
    fn empty_text_counts_as_no_value() {
        let field = ExtractedField {
            value: Some(FieldValue::Text(String::new())),
            confidence: 0.9,
            evidence: vec![],
        };
        assert!(!field.has_value());
        assert!(!ExtractedField::unresolved().has_value());

        let number = ExtractedField {
            value: Some(FieldValue::Number(0.0)),
            confidence: 0.9,
            evidence: vec![],
        };
        assert!(number.has_value());
    }

    #[test]
    fn extraction_result_round_trips_through_json() {
        let mut fields = BTreeMap::new();
        fields.insert(
            "total_amount".to_string(),
            ExtractedField {
                value: Some(FieldValue::Number(1200.0)),
                confidence: 0.55,
                evidence: vec![SourceEvidence::quote_only("Total Amount: $1200.00")],
            },
        );
        let result = ExtractionResult {
            document_type: DocumentKind::InsuranceClaim,
            fields,
            line_items: vec![],
            raw_response: serde_json::json!({"mode": "fallback"}),
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: ExtractionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.document_type, DocumentKind::InsuranceClaim);
        assert_eq!(
            back.fields["total_amount"].value,
            Some(FieldValue::Number(1200.0))
        );
    }
}
