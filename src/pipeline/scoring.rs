//! Document-level confidence reduction.

use crate::pipeline::extract::{ExtractedField, ExtractionResult};

/// Weight of the field average in the document score.
const FIELD_WEIGHT: f32 = 0.8;

/// Weight of the line-item average in the document score.
const LINE_ITEM_WEIGHT: f32 = 0.2;

/// Stand-in line-item score for documents with no line items, so they are
/// neither undefined nor unfairly penalized.
const NO_LINE_ITEMS_SCORE: f32 = 0.5;

/// Reduce per-field and per-line-item confidences to one document score in
/// [0, 1], rounded to 4 decimal places.
pub fn document_confidence(result: &ExtractionResult) -> f32 {
    let field_scores: Vec<f32> = result.fields.values().map(field_score).collect();
    let field_mean = mean(&field_scores);

    let line_item_scores: Vec<f32> = result.line_items.iter().map(|i| i.confidence).collect();
    let line_item_mean = if line_item_scores.is_empty() {
        NO_LINE_ITEMS_SCORE
    } else {
        mean(&line_item_scores)
    };

    let weighted = field_mean * FIELD_WEIGHT + line_item_mean * LINE_ITEM_WEIGHT;
    round4(weighted.clamp(0.0, 1.0))
}

/// A field with no usable value scores 0 regardless of its confidence.
fn field_score(field: &ExtractedField) -> f32 {
    if field.has_value() {
        field.confidence
    } else {
        0.0
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}
