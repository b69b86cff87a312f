//! Parsing of the language model's JSON response.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::ExtractError;

/// Response payload shape the model is instructed to produce. Line items are
/// parsed leniently — entries that fail to deserialize are skipped.
#[derive(Debug)]
pub struct RawExtraction {
    pub document_type: Option<String>,
    pub fields: BTreeMap<String, RawField>,
    pub line_items: Vec<RawLineItem>,
    /// The full parsed payload, retained for audit.
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawField {
    pub value: Option<serde_json::Value>,
    pub confidence: Option<f32>,
    pub quote: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLineItem {
    pub service: Option<String>,
    pub code: Option<String>,
    pub amount: Option<serde_json::Value>,
    pub confidence: Option<f32>,
    pub quote: Option<String>,
}

/// Parse a model response into [`RawExtraction`], tolerating a ```json fence
/// around the payload.
pub fn parse_extraction_response(response: &str) -> Result<RawExtraction, ExtractError> {
    let json_str = strip_code_fences(response);

    let raw: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| ExtractError::JsonParsing(e.to_string()))?;

    let document_type = raw
        .get("document_type")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string());

    let mut fields = BTreeMap::new();
    if let Some(map) = raw.get("fields").and_then(|v| v.as_object()) {
        for (name, value) in map {
            if let Ok(field) = serde_json::from_value::<RawField>(value.clone()) {
                fields.insert(name.clone(), field);
            }
        }
    }

    let line_items = match raw.get("line_items").and_then(|v| v.as_array()) {
        Some(items) => items
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
        None => vec![],
    };

    Ok(RawExtraction {
        document_type,
        fields,
        line_items,
        raw,
    })
}

/// Strip a surrounding ```json ... ``` fence when present.
fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let response = r#"{
            "document_type": "insurance_claim",
            "fields": {
                "claim_number": {"value": "CLM-9001", "confidence": 0.92, "quote": "Claim Number: CLM-9001"}
            },
            "line_items": []
        }"#;
        let parsed = parse_extraction_response(response).unwrap();
        assert_eq!(parsed.document_type.as_deref(), Some("insurance_claim"));
        assert_eq!(parsed.fields.len(), 1);
        assert_eq!(
            parsed.fields["claim_number"].quote.as_deref(),
            Some("Claim Number: CLM-9001")
        );
        assert!(parsed.line_items.is_empty());
    }

    #[test]
    fn parses_fenced_json() {
        let response = "```json\n{\"document_type\": \"medical_bill\", \"fields\": {}, \"line_items\": []}\n```";
        let parsed = parse_extraction_response(response).unwrap();
        assert_eq!(parsed.document_type.as_deref(), Some("medical_bill"));
    }

    #[test]
    fn missing_document_type_is_none() {
        let parsed = parse_extraction_response(r#"{"fields": {}, "line_items": []}"#).unwrap();
        assert!(parsed.document_type.is_none());
    }

    #[test]
    fn lenient_line_items_skip_bad_entries() {
        let response = r#"{
            "document_type": "medical_bill",
            "fields": {},
            "line_items": [
                {"service": "Office visit", "code": "99213", "amount": 120.0, "confidence": 0.8, "quote": "visit"},
                "not an object",
                {"service": "X-ray", "code": "71045", "amount": "$45.00", "confidence": 0.7, "quote": null}
            ]
        }"#;
        let parsed = parse_extraction_response(response).unwrap();
        assert_eq!(parsed.line_items.len(), 2);
        assert_eq!(parsed.line_items[1].service.as_deref(), Some("X-ray"));
    }

    #[test]
    fn invalid_json_is_an_error() {
        let result = parse_extraction_response("no json here");
        assert!(matches!(result, Err(ExtractError::JsonParsing(_))));
    }

    #[test]
    fn raw_payload_retained_for_audit() {
        let response = r#"{"document_type": "insurance_claim", "fields": {}, "line_items": [], "notes": "extra"}"#;
        let parsed = parse_extraction_response(response).unwrap();
        assert_eq!(parsed.raw["notes"], "extra");
    }
}
