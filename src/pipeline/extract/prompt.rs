//! Instruction template for the language-model extraction strategy.

/// Character budget for OCR text sent to the model.
pub const MAX_PROMPT_CHARS: usize = 12_000;

pub const EXTRACTION_SYSTEM_PROMPT: &str =
    "You extract structured fields from OCR text of insurance claims and medical bills. \
     Extract only information explicitly present in the document. Respond with JSON only.";

/// Build the extraction prompt for one document's OCR text.
pub fn build_extraction_prompt(full_text: &str) -> String {
    let text = truncate_chars(full_text, MAX_PROMPT_CHARS);
    format!(
        r#"You are extracting structured data from OCR output of either an insurance claim or medical bill.
Return JSON only with this format:
{{
  "document_type": "insurance_claim|medical_bill",
  "fields": {{
    "<field_name>": {{"value": "...", "confidence": 0.0-1.0, "quote": "short source text"}}
  }},
  "line_items": [
    {{"service": "...", "code": "...", "amount": 0.0, "confidence": 0.0-1.0, "quote": "short source text"}}
  ]
}}
Use field names:
- insurance_claim: claim_number, claimant_name, date_of_service, total_amount, provider_name, policy_number
- medical_bill: invoice_number, patient_name, date_of_service, total_amount, provider_name

OCR TEXT:
{text}"#
    )
}

/// Truncate to at most `max_chars` characters, respecting char boundaries.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
