//! The review-required decision.

use crate::pipeline::extract::ExtractionResult;
use crate::pipeline::fields::critical_field_names;

/// A document needs human review when its confidence falls below the
/// configured threshold, or when any critical field for its type is absent
/// or empty — regardless of confidence.
pub fn needs_review(result: &ExtractionResult, confidence: f32, threshold: f32) -> bool {
    confidence < threshold || has_missing_critical(result)
}

fn has_missing_critical(result: &ExtractionResult) -> bool {
    critical_field_names(result.document_type).any(|name| {
        result
            .fields
            .get(name)
            .map_or(true, |field| !field.has_value())
    })
}
