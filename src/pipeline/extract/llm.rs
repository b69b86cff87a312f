//! Language-model-backed extraction strategy.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::anchor::anchor_quote;
use super::normalize::{coerce_amount, coerce_field_value, coerce_total_amount};
use super::parser::{parse_extraction_response, RawField, RawLineItem};
use super::prompt::{build_extraction_prompt, EXTRACTION_SYSTEM_PROMPT};
use super::types::{
    ExtractedField, ExtractionResult, ExtractionStrategy, LineItemExtraction, SourceEvidence,
};
use super::ExtractError;
use crate::models::enums::DocumentKind;
use crate::pipeline::classify::classify;
use crate::pipeline::ocr::OcrResult;

/// Text-generation service abstraction (allows mocking).
pub trait LlmClient {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, ExtractError>;
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
pub struct ChatCompletionsClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl ChatCompletionsClient {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

impl LlmClient for ChatCompletionsClient {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, ExtractError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExtractError::LlmConnection(self.base_url.clone())
                } else if e.is_timeout() {
                    ExtractError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ExtractError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractError::LlmApi {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ExtractError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ExtractError::ResponseParsing("Empty completion".into()))
    }
}

/// Mock LLM client for testing — returns a configurable response.
pub struct MockLlmClient {
    response: String,
}

impl MockLlmClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
        }
    }
}

impl LlmClient for MockLlmClient {
    fn generate(&self, _system: &str, _prompt: &str) -> Result<String, ExtractError> {
        Ok(self.response.clone())
    }
}

/// Extraction strategy that prompts an external text-generation service and
/// anchors its quoted evidence back to OCR coordinates.
pub struct LlmExtractor {
    client: Box<dyn LlmClient + Send + Sync>,
}

impl LlmExtractor {
    pub fn new(client: Box<dyn LlmClient + Send + Sync>) -> Self {
        Self { client }
    }
}

impl ExtractionStrategy for LlmExtractor {
    fn extract(&self, ocr: &OcrResult) -> Result<ExtractionResult, ExtractError> {
        let prompt = build_extraction_prompt(&ocr.full_text);
        let response = self.client.generate(EXTRACTION_SYSTEM_PROMPT, &prompt)?;
        let raw = parse_extraction_response(&response)?;

        // A response missing document_type falls back to the heuristic
        // classifier on the same text.
        let document_type = raw
            .document_type
            .as_deref()
            .and_then(|s| DocumentKind::from_str(s).ok())
            .unwrap_or_else(|| classify(&ocr.full_text));

        let mut fields: BTreeMap<String, ExtractedField> = raw
            .fields
            .iter()
            .map(|(name, field)| (name.clone(), coerce_field(field, ocr)))
            .collect();
        coerce_total_amount(&mut fields);

        let line_items = raw
            .line_items
            .iter()
            .map(|item| coerce_line_item(item, ocr))
            .collect();

        tracing::debug!(
            document_type = document_type.as_str(),
            fields = fields.len(),
            "Language-model extraction parsed"
        );

        Ok(ExtractionResult {
            document_type,
            fields,
            line_items,
            raw_response: raw.raw,
        })
    }
}

fn coerce_field(raw: &RawField, ocr: &OcrResult) -> ExtractedField {
    ExtractedField {
        value: raw.value.as_ref().and_then(coerce_field_value),
        confidence: raw.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
        evidence: evidence_for(raw.quote.as_deref(), ocr),
    }
}

fn coerce_line_item(raw: &RawLineItem, ocr: &OcrResult) -> LineItemExtraction {
    LineItemExtraction {
        service: raw.service.clone(),
        code: raw.code.clone(),
        amount: raw.amount.as_ref().and_then(coerce_amount),
        confidence: raw.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
        evidence: evidence_for(raw.quote.as_deref(), ocr),
    }
}

fn evidence_for(quote: Option<&str>, ocr: &OcrResult) -> Vec<SourceEvidence> {
    match quote {
        Some(q) => vec![anchor_quote(q, ocr)],
        None => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::types::FieldValue;
    use crate::pipeline::ocr::{BoundingBox, OcrPage, OcrWord};

    fn ocr_with_words(text: &str) -> OcrResult {
        let words = text
            .split_whitespace()
            .enumerate()
            .map(|(i, w)| OcrWord {
                text: w.to_string(),
                confidence: 0.9,
                bbox: Some(BoundingBox {
                    x: (i * 100) as f32,
                    y: 0.0,
                    width: 90.0,
                    height: 20.0,
                }),
                page_number: 1,
            })
            .collect();
        OcrResult::from_pages(vec![OcrPage {
            page_number: 1,
            text: text.to_string(),
            words,
        }])
    }

    fn claim_response() -> &'static str {
        r#"```json
{
  "document_type": "insurance_claim",
  "fields": {
    "claim_number": {"value": "CLM-9001", "confidence": 0.93, "quote": "Claim Number: CLM-9001"},
    "total_amount": {"value": "$1,200.00", "confidence": 0.9, "quote": null}
  },
  "line_items": [
    {"service": "Office visit", "code": "99213", "amount": "120.00", "confidence": 0.8, "quote": null}
  ]
}
```"#
    }

    #[test]
    fn extracts_fields_with_anchored_evidence() {
        let ocr = ocr_with_words("Claim Number: CLM-9001 Total Amount: $1200.00");
        let extractor = LlmExtractor::new(Box::new(MockLlmClient::new(claim_response())));

        let result = extractor.extract(&ocr).unwrap();
        assert_eq!(result.document_type, DocumentKind::InsuranceClaim);

        let claim = &result.fields["claim_number"];
        assert_eq!(claim.value, Some(FieldValue::Text("CLM-9001".into())));
        assert_eq!(claim.evidence.len(), 1);
        assert!(claim.evidence[0].bbox.is_some());
        assert_eq!(claim.evidence[0].page_number, Some(1));

        // Amount text coerced to a number; no quote means no evidence
        let total = &result.fields["total_amount"];
        assert_eq!(total.value, Some(FieldValue::Number(1200.0)));
        assert!(total.evidence.is_empty());

        assert_eq!(result.line_items.len(), 1);
        assert_eq!(result.line_items[0].amount, Some(120.0));
    }

    #[test]
    fn missing_document_type_uses_classifier() {
        let ocr = ocr_with_words("Invoice for patient care with CPT codes");
        let response = r#"{"fields": {}, "line_items": []}"#;
        let extractor = LlmExtractor::new(Box::new(MockLlmClient::new(response)));

        let result = extractor.extract(&ocr).unwrap();
        assert_eq!(result.document_type, DocumentKind::MedicalBill);
    }

    #[test]
    fn unknown_document_type_uses_classifier() {
        let ocr = ocr_with_words("claim policy claimant");
        let response = r#"{"document_type": "receipt", "fields": {}, "line_items": []}"#;
        let extractor = LlmExtractor::new(Box::new(MockLlmClient::new(response)));

        let result = extractor.extract(&ocr).unwrap();
        assert_eq!(result.document_type, DocumentKind::InsuranceClaim);
    }

    #[test]
    fn confidence_is_clamped() {
        let ocr = ocr_with_words("claim");
        let response = r#"{
            "document_type": "insurance_claim",
            "fields": {"claim_number": {"value": "X", "confidence": 3.5, "quote": null}},
            "line_items": []
        }"#;
        let extractor = LlmExtractor::new(Box::new(MockLlmClient::new(response)));

        let result = extractor.extract(&ocr).unwrap();
        assert_eq!(result.fields["claim_number"].confidence, 1.0);
    }

    #[test]
    fn malformed_response_is_an_error() {
        let ocr = ocr_with_words("claim");
        let extractor = LlmExtractor::new(Box::new(MockLlmClient::new("I could not parse this")));
        assert!(matches!(
            extractor.extract(&ocr),
            Err(ExtractError::JsonParsing(_))
        ));
    }

    #[test]
    fn raw_payload_is_kept_for_audit() {
        let ocr = ocr_with_words("claim");
        let response = r#"{"document_type": "insurance_claim", "fields": {}, "line_items": []}"#;
        let extractor = LlmExtractor::new(Box::new(MockLlmClient::new(response)));

        let result = extractor.extract(&ocr).unwrap();
        assert_eq!(result.raw_response["document_type"], "insurance_claim");
    }
}
