//! A single trademark row as published by the registry

use serde::{Deserialize, Serialize};

use super::nice_class::NiceClass;

/// One trademark file from the phonetic search table.
///
/// `nice_class` keeps the registry's textual value; records that reach a
/// `SearchResult` have already been normalized so it parses as 1-45.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistryRecord {
    pub name: String,
    pub case_number: String,
    pub registration_number: Option<String>,
    pub holder: String,
    pub nice_class: String,
    pub sign_type: Option<String>,
}

impl RegistryRecord {
    /// Typed class, `None` while the record is still unvalidated.
    pub fn nice_class_number(&self) -> Option<NiceClass> {
        self.nice_class.parse().ok()
    }

    pub fn is_registered(&self) -> bool {
        self.registration_number
            .as_deref()
            .is_some_and(|number| !number.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(class: &str, registration: Option<&str>) -> RegistryRecord {
        RegistryRecord {
            name: "LUNA AZUL".to_string(),
            case_number: "2345678".to_string(),
            registration_number: registration.map(str::to_string),
            holder: "CAFETALERA DEL SUR, S.A. DE C.V.".to_string(),
            nice_class: class.to_string(),
            sign_type: Some("NOMINATIVA".to_string()),
        }
    }

    #[test]
    fn class_number_parses_only_valid_values() {
        assert_eq!(record("30", None).nice_class_number().map(NiceClass::number), Some(30));
        assert!(record("X", None).nice_class_number().is_none());
        assert!(record("0", None).nice_class_number().is_none());
    }

    #[test]
    fn blank_registration_number_means_pending() {
        assert!(record("30", Some("1987654")).is_registered());
        assert!(!record("30", Some("  ")).is_registered());
        assert!(!record("30", None).is_registered());
    }
}
