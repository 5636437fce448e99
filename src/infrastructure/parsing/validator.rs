//! Record validation and normalization
//!
//! Rejected records are dropped by the caller; a few malformed rows never
//! fail a page.

use tracing::debug;

use super::Validator;
use super::error::{ParsingError, ParsingResult};
use crate::domain::{NiceClass, RegistryRecord};

#[derive(Debug, Clone, Copy, Default)]
pub struct RecordValidator;

impl RecordValidator {
    pub const fn new() -> Self {
        Self
    }

    /// Validated record with trimmed fields and a canonical class ("09" -> "9").
    pub fn normalize(&self, record: RegistryRecord) -> ParsingResult<RegistryRecord> {
        self.validate(&record)?;

        let class = parse_class(&record.nice_class)?;
        let trim_optional = |value: Option<String>| {
            value
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
        };

        Ok(RegistryRecord {
            name: record.name.trim().to_string(),
            case_number: record.case_number.trim().to_string(),
            registration_number: trim_optional(record.registration_number),
            holder: record.holder.trim().to_string(),
            nice_class: class.to_string(),
            sign_type: trim_optional(record.sign_type),
        })
    }

    /// Normalized record, or `None` after logging why it was dropped.
    pub fn accept(&self, record: RegistryRecord) -> Option<RegistryRecord> {
        match self.normalize(record) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Record dropped: {}", e);
                None
            }
        }
    }
}

impl Validator<RegistryRecord> for RecordValidator {
    fn validate(&self, data: &RegistryRecord) -> ParsingResult<()> {
        if data.name.trim().is_empty() {
            return Err(ParsingError::rejected("name", "empty"));
        }
        if data.case_number.trim().is_empty() {
            return Err(ParsingError::rejected("case_number", "empty"));
        }
        if data.nice_class.trim().is_empty() {
            return Err(ParsingError::rejected("nice_class", "empty"));
        }
        parse_class(&data.nice_class).map(|_| ())
    }
}

fn parse_class(raw: &str) -> ParsingResult<NiceClass> {
    raw.parse::<NiceClass>()
        .map_err(|e| ParsingError::rejected("nice_class", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record(name: &str, case_number: &str, class: &str) -> RegistryRecord {
        RegistryRecord {
            name: name.to_string(),
            case_number: case_number.to_string(),
            registration_number: Some("  ".to_string()),
            holder: " TITULAR ".to_string(),
            nice_class: class.to_string(),
            sign_type: None,
        }
    }

    #[rstest]
    #[case("", "100", "30", "name")]
    #[case("LUNA", " ", "30", "case_number")]
    #[case("LUNA", "100", "", "nice_class")]
    #[case("LUNA", "100", "46", "nice_class")]
    #[case("LUNA", "100", "0", "nice_class")]
    #[case("LUNA", "100", "treinta", "nice_class")]
    fn rejects_incomplete_records(
        #[case] name: &str,
        #[case] case_number: &str,
        #[case] class: &str,
        #[case] field: &str,
    ) {
        let error = RecordValidator::new()
            .validate(&record(name, case_number, class))
            .unwrap_err();
        assert!(matches!(error, ParsingError::RecordRejected { field: f, .. } if f == field));
    }

    #[test]
    fn normalizes_accepted_records() {
        let normalized = RecordValidator::new()
            .normalize(record(" LUNA ", "100", " 09 "))
            .unwrap();
        assert_eq!(normalized.name, "LUNA");
        assert_eq!(normalized.nice_class, "9");
        assert_eq!(normalized.holder, "TITULAR");
        assert!(normalized.registration_number.is_none());
    }

    #[test]
    fn accept_drops_invalid_records() {
        let validator = RecordValidator::new();
        assert!(validator.accept(record("LUNA", "100", "99")).is_none());
        assert!(validator.accept(record("LUNA", "100", "45")).is_some());
    }
}
