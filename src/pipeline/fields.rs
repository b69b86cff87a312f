//! Single registry for document-type field definitions.
//!
//! Used by the regex fallback strategy (patterns), extraction validation
//! (required field set), and the review decision policy (critical flags).

use crate::models::enums::DocumentKind;

/// One named field a document type is expected to carry.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Fallback extraction pattern, compiled case-insensitively. Group 1 (when
    /// present) is the field value; otherwise the whole match is.
    pub pattern: &'static str,
    /// A missing critical field alone forces human review.
    pub critical: bool,
}

const INSURANCE_CLAIM_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "claim_number",
        pattern: r"claim\s*(?:number|#)?\s*[:\-]?\s*([A-Z0-9\-]+)",
        critical: true,
    },
    FieldSpec {
        name: "claimant_name",
        pattern: r"claimant(?:\sname)?\s*[:\-]?\s*([A-Za-z ,.'-]+)",
        critical: false,
    },
    FieldSpec {
        name: "date_of_service",
        pattern: r"date of service\s*[:\-]?\s*([0-9/\-]{6,12})",
        critical: true,
    },
    FieldSpec {
        name: "total_amount",
        pattern: r"total(?: amount)?\s*[:\-]?\s*(\$?[0-9,]+\.[0-9]{2})",
        critical: true,
    },
    FieldSpec {
        name: "provider_name",
        pattern: r"provider(?: name)?\s*[:\-]?\s*([A-Za-z0-9 ,.'-]+)",
        critical: false,
    },
    FieldSpec {
        name: "policy_number",
        pattern: r"policy(?: number|#)?\s*[:\-]?\s*([A-Z0-9\-]+)",
        critical: false,
    },
];

const MEDICAL_BILL_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "invoice_number",
        pattern: r"invoice(?: number|#)?\s*[:\-]?\s*([A-Z0-9\-]+)",
        critical: true,
    },
    FieldSpec {
        name: "patient_name",
        pattern: r"patient(?: name)?\s*[:\-]?\s*([A-Za-z ,.'-]+)",
        critical: false,
    },
    FieldSpec {
        name: "date_of_service",
        pattern: r"date of service\s*[:\-]?\s*([0-9/\-]{6,12})",
        critical: true,
    },
    FieldSpec {
        name: "total_amount",
        pattern: r"total(?: amount)?\s*[:\-]?\s*(\$?[0-9,]+\.[0-9]{2})",
        critical: true,
    },
    FieldSpec {
        name: "provider_name",
        pattern: r"provider(?: name)?\s*[:\-]?\s*([A-Za-z0-9 ,.'-]+)",
        critical: false,
    },
];

/// Field specs for a document type, in extraction order.
pub fn field_specs(kind: DocumentKind) -> &'static [FieldSpec] {
    match kind {
        DocumentKind::InsuranceClaim => INSURANCE_CLAIM_FIELDS,
        DocumentKind::MedicalBill => MEDICAL_BILL_FIELDS,
    }
}

/// Every field name the type's final mapping must contain.
pub fn required_field_names(kind: DocumentKind) -> impl Iterator<Item = &'static str> {
    field_specs(kind).iter().map(|f| f.name)
}

/// Fields whose absence alone forces human review.
pub fn critical_field_names(kind: DocumentKind) -> impl Iterator<Item = &'static str> {
    field_specs(kind)
        .iter()
        .filter(|f| f.critical)
        .map(|f| f.name)
}
