//! Deterministic regex extraction, used when no language-model credential is
//! configured. Produces the same result shape as the LLM strategy, minus
//! OCR-word linkage (fallback evidence carries quotes only).

use std::collections::BTreeMap;

use regex::Regex;

use super::normalize::{coerce_total_amount, UNRESOLVED_CONFIDENCE};
use super::types::{
    ExtractedField, ExtractionResult, ExtractionStrategy, FieldValue, LineItemExtraction,
    SourceEvidence,
};
use super::ExtractError;
use crate::models::enums::DocumentKind;
use crate::pipeline::classify::classify;
use crate::pipeline::fields::field_specs;
use crate::pipeline::ocr::OcrResult;

/// Confidence for a successful pattern match.
const MATCH_CONFIDENCE: f32 = 0.55;

/// Confidence for a matched line item row.
const LINE_ITEM_CONFIDENCE: f32 = 0.5;

/// Most line items taken from one document.
const MAX_LINE_ITEMS: usize = 20;

/// "<label> <alphanumeric code> $<amount with two decimals>"
const LINE_ITEM_PATTERN: &str =
    r"([A-Za-z][A-Za-z0-9\s\-]{2,40})\s+([A-Z0-9]{3,12})\s+\$?([0-9]+\.[0-9]{2})";

struct CompiledField {
    name: &'static str,
    regex: Regex,
}

/// Regex-driven extraction strategy. Patterns come from the field registry
/// and are compiled once at construction.
pub struct RegexExtractor {
    insurance_fields: Vec<CompiledField>,
    medical_fields: Vec<CompiledField>,
    line_item_regex: Regex,
}

impl Default for RegexExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexExtractor {
    pub fn new() -> Self {
        Self {
            insurance_fields: compile_fields(DocumentKind::InsuranceClaim),
            medical_fields: compile_fields(DocumentKind::MedicalBill),
            line_item_regex: Regex::new(LINE_ITEM_PATTERN).expect("valid line item pattern"),
        }
    }

    fn compiled_fields(&self, kind: DocumentKind) -> &[CompiledField] {
        match kind {
            DocumentKind::InsuranceClaim => &self.insurance_fields,
            DocumentKind::MedicalBill => &self.medical_fields,
        }
    }

    fn extract_line_items(&self, text: &str) -> Vec<LineItemExtraction> {
        self.line_item_regex
            .captures_iter(text)
            .take(MAX_LINE_ITEMS)
            .map(|caps| LineItemExtraction {
                service: caps.get(1).map(|m| m.as_str().trim().to_string()),
                code: caps.get(2).map(|m| m.as_str().trim().to_string()),
                amount: caps.get(3).and_then(|m| m.as_str().parse().ok()),
                confidence: LINE_ITEM_CONFIDENCE,
                evidence: vec![SourceEvidence::quote_only(&caps[0])],
            })
            .collect()
    }
}

fn compile_fields(kind: DocumentKind) -> Vec<CompiledField> {
    field_specs(kind)
        .iter()
        .map(|spec| CompiledField {
            name: spec.name,
            regex: Regex::new(&format!("(?i){}", spec.pattern)).expect("valid field pattern"),
        })
        .collect()
}

/// First match of the field pattern against the full text. A capture group
/// yields the trimmed group as the value; otherwise the whole match is the
/// value. The trimmed whole match doubles as the evidence quote.
fn field_from_pattern(text: &str, regex: &Regex) -> ExtractedField {
    let Some(caps) = regex.captures(text) else {
        return ExtractedField {
            value: None,
            confidence: UNRESOLVED_CONFIDENCE,
            evidence: vec![],
        };
    };

    let quote = caps[0].trim().to_string();
    let value = match caps.get(1) {
        Some(group) => group.as_str().trim().to_string(),
        None => quote.clone(),
    };

    ExtractedField {
        value: Some(FieldValue::Text(value)),
        confidence: MATCH_CONFIDENCE,
        evidence: vec![SourceEvidence::quote_only(&quote)],
    }
}

impl ExtractionStrategy for RegexExtractor {
    fn extract(&self, ocr: &OcrResult) -> Result<ExtractionResult, ExtractError> {
        let text = &ocr.full_text;
        let document_type = classify(text);

        let mut fields: BTreeMap<String, ExtractedField> = self
            .compiled_fields(document_type)
            .iter()
            .map(|field| (field.name.to_string(), field_from_pattern(text, &field.regex)))
            .collect();
        coerce_total_amount(&mut fields);

        let line_items = self.extract_line_items(text);

        tracing::debug!(
            document_type = document_type.as_str(),
            line_items = line_items.len(),
            "Fallback extraction complete"
        );

        Ok(ExtractionResult {
            document_type,
            fields,
            line_items,
            raw_response: serde_json::json!({"mode": "fallback"}),
        })
    }
}
