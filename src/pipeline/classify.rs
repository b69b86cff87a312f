use crate::models::enums::DocumentKind;

/// Signal tokens for the insurance-claim category.
const INSURANCE_SIGNALS: &[&str] = &["claim", "policy", "claimant", "insurance"];

/// Signal tokens for the medical-bill category.
const MEDICAL_SIGNALS: &[&str] = &["invoice", "cpt", "medical", "patient", "provider bill"];

/// Heuristic document-type classifier.
///
/// Scores each category by how many of its signal tokens occur as substrings
/// of the lowercased text (each token counted at most once). Ties go to
/// insurance_claim. Advisory only: the regex fallback strategy relies on it,
/// and the LLM strategy falls back to it when a response omits the
/// document type.
pub fn classify(full_text: &str) -> DocumentKind {
    let normalized = full_text.to_lowercase();
    let insurance = signal_count(&normalized, INSURANCE_SIGNALS);
    let medical = signal_count(&normalized, MEDICAL_SIGNALS);

    if insurance >= medical {
        DocumentKind::InsuranceClaim
    } else {
        DocumentKind::MedicalBill
    }
}

fn signal_count(normalized: &str, signals: &[&str]) -> usize {
    signals.iter().filter(|t| normalized.contains(*t)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_language_classifies_as_insurance() {
        let kind = classify("Claim Number: CLM-1 filed under policy POL-2 by the claimant");
        assert_eq!(kind, DocumentKind::InsuranceClaim);
    }

    #[test]
    fn billing_language_classifies_as_medical() {
        let kind = classify("Invoice #881 — patient copay due. CPT 99213.");
        assert_eq!(kind, DocumentKind::MedicalBill);
    }

    #[test]
    fn tie_breaks_to_insurance_claim() {
        // Exactly one token from each vocabulary
        let kind = classify("claim invoice");
        assert_eq!(kind, DocumentKind::InsuranceClaim);
    }

    #[test]
    fn empty_text_defaults_to_insurance_claim() {
        assert_eq!(classify(""), DocumentKind::InsuranceClaim);
    }

    #[test]
    fn repeated_tokens_count_once() {
        // "patient" four times still scores 1; two insurance tokens win
        let kind = classify("patient patient patient patient claim policy");
        assert_eq!(kind, DocumentKind::InsuranceClaim);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("INVOICE for PATIENT care, MEDICAL services"), DocumentKind::MedicalBill);
    }
}
