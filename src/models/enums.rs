use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(DocumentStatus {
    Uploaded => "uploaded",
    Processed => "processed",
    ReviewRequired => "review_required",
    Reviewed => "reviewed",
    Rejected => "rejected",
    Failed => "failed",
});

str_enum!(ReviewState {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

str_enum!(DocumentKind {
    InsuranceClaim => "insurance_claim",
    MedicalBill => "medical_bill",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn document_status_round_trip() {
        for (variant, s) in [
            (DocumentStatus::Uploaded, "uploaded"),
            (DocumentStatus::Processed, "processed"),
            (DocumentStatus::ReviewRequired, "review_required"),
            (DocumentStatus::Reviewed, "reviewed"),
            (DocumentStatus::Rejected, "rejected"),
            (DocumentStatus::Failed, "failed"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(DocumentStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn review_state_round_trip() {
        for (variant, s) in [
            (ReviewState::Pending, "pending"),
            (ReviewState::Approved, "approved"),
            (ReviewState::Rejected, "rejected"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ReviewState::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn document_kind_round_trip() {
        for (variant, s) in [
            (DocumentKind::InsuranceClaim, "insurance_claim"),
            (DocumentKind::MedicalBill, "medical_bill"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(DocumentKind::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn document_kind_serializes_as_wire_string() {
        let json = serde_json::to_string(&DocumentKind::InsuranceClaim).unwrap();
        assert_eq!(json, "\"insurance_claim\"");
        let back: DocumentKind = serde_json::from_str("\"medical_bill\"").unwrap();
        assert_eq!(back, DocumentKind::MedicalBill);
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(DocumentStatus::from_str("invalid").is_err());
        assert!(ReviewState::from_str("unknown").is_err());
        assert!(DocumentKind::from_str("").is_err());
    }
}
