//! Value coercion shared by both extraction strategies.

use std::collections::BTreeMap;

use super::types::{ExtractedField, FieldValue};

/// Field name whose value is coerced to a number after extraction.
pub const TOTAL_AMOUNT_FIELD: &str = "total_amount";

/// Confidence recorded when a field could not be resolved.
pub const UNRESOLVED_CONFIDENCE: f32 = 0.2;

/// Parse a monetary amount out of free text: strip everything except digits
/// and the decimal point, then parse.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let clean: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    if clean.is_empty() {
        return None;
    }
    clean.parse().ok()
}

/// Coerce a raw JSON value into a field value. Strings and numbers pass
/// through; anything else is treated as absent.
pub fn coerce_field_value(raw: &serde_json::Value) -> Option<FieldValue> {
    match raw {
        serde_json::Value::String(s) => Some(FieldValue::Text(s.clone())),
        serde_json::Value::Number(n) => n.as_f64().map(FieldValue::Number),
        _ => None,
    }
}

/// Coerce a raw JSON amount (string or number) into f64 via [`parse_amount`].
pub fn coerce_amount(raw: &serde_json::Value) -> Option<f64> {
    match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// Re-type the total-amount field as a number. A text value that fails to
/// parse becomes absent with [`UNRESOLVED_CONFIDENCE`]; a parsed number
/// keeps the field's prior confidence and evidence.
pub fn coerce_total_amount(fields: &mut BTreeMap<String, ExtractedField>) {
    let Some(field) = fields.get_mut(TOTAL_AMOUNT_FIELD) else {
        return;
    };
    let Some(FieldValue::Text(raw)) = &field.value else {
        return;
    };

    match parse_amount(raw) {
        Some(amount) => field.value = Some(FieldValue::Number(amount)),
        None => {
            field.value = None;
            field.confidence = UNRESOLVED_CONFIDENCE;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_currency_text() {
        assert_eq!(parse_amount("$1,200.00"), Some(1200.0));
        assert_eq!(parse_amount("1200.00"), Some(1200.0));
        assert_eq!(parse_amount("USD 88.50"), Some(88.5));
    }

    #[test]
    fn rejects_non_numeric_text() {
        assert_eq!(parse_amount("N/A"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("1.2.3.4."), None);
    }

    #[test]
    fn total_amount_text_becomes_number() {
        let mut fields = BTreeMap::new();
        fields.insert(
            TOTAL_AMOUNT_FIELD.to_string(),
            ExtractedField {
                value: Some(FieldValue::Text("$1,200.00".into())),
                confidence: 0.55,
                evidence: vec![],
            },
        );
        coerce_total_amount(&mut fields);

        let field = &fields[TOTAL_AMOUNT_FIELD];
        assert_eq!(field.value, Some(FieldValue::Number(1200.0)));
        assert!((field.confidence - 0.55).abs() < f32::EPSILON);
    }

    #[test]
    fn unparseable_total_amount_becomes_absent() {
        let mut fields = BTreeMap::new();
        fields.insert(
            TOTAL_AMOUNT_FIELD.to_string(),
            ExtractedField {
                value: Some(FieldValue::Text("pending".into())),
                confidence: 0.55,
                evidence: vec![],
            },
        );
        coerce_total_amount(&mut fields);

        let field = &fields[TOTAL_AMOUNT_FIELD];
        assert!(field.value.is_none());
        assert!((field.confidence - UNRESOLVED_CONFIDENCE).abs() < f32::EPSILON);
    }

    #[test]
    fn numeric_total_amount_left_alone() {
        let mut fields = BTreeMap::new();
        fields.insert(
            TOTAL_AMOUNT_FIELD.to_string(),
            ExtractedField {
                value: Some(FieldValue::Number(99.0)),
                confidence: 0.9,
                evidence: vec![],
            },
        );
        coerce_total_amount(&mut fields);
        assert_eq!(fields[TOTAL_AMOUNT_FIELD].value, Some(FieldValue::Number(99.0)));
    }

    #[test]
    fn json_values_coerce_by_type() {
        assert_eq!(
            coerce_field_value(&serde_json::json!("CLM-1")),
            Some(FieldValue::Text("CLM-1".into()))
        );
        assert_eq!(
            coerce_field_value(&serde_json::json!(12.5)),
            Some(FieldValue::Number(12.5))
        );
        assert_eq!(coerce_field_value(&serde_json::json!(null)), None);
        assert_eq!(coerce_field_value(&serde_json::json!(["a"])), None);

        assert_eq!(coerce_amount(&serde_json::json!("$45.00")), Some(45.0));
        assert_eq!(coerce_amount(&serde_json::json!(45.0)), Some(45.0));
        assert_eq!(coerce_amount(&serde_json::json!(null)), None);
    }
}
