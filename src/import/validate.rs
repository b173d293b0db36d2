//! Per-record validation.

use super::record::{parse_coordinate, parse_population, parse_postal_codes, MairieRecord};
use crate::config::NumericParsing;
use crate::error_handling::RecordError;
use crate::storage::CommuneUpsert;

/// A record that passed validation, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecord {
    pub commune: CommuneUpsert,
    pub email: Option<String>,
    pub contact_name: Option<String>,
}

/// Returns `true` for metropolitan (`01`-`95`), Corsican (`2A`, `2B`) and
/// overseas (`971`-`978`) department codes.
///
/// This is a grammar check only: `20` passes it although Corsica has been
/// split into `2A` and `2B`. The import rejects such codes against the
/// department table.
pub fn is_valid_department_code(code: &str) -> bool {
    if code == "2A" || code == "2B" {
        return true;
    }
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    match code.len() {
        2 => matches!(code.parse::<u16>(), Ok(n) if (1..=95).contains(&n)),
        3 => matches!(code.parse::<u16>(), Ok(n) if (971..=978).contains(&n)),
        _ => false,
    }
}

/// Minimal syntactic email check: contains both `@` and `.`.
pub fn is_valid_email(email: &str) -> bool {
    email.contains('@') && email.contains('.')
}

/// Validates a record. Checks run in a fixed order and the first failure wins.
pub fn validate_record(
    record: &MairieRecord,
    mode: NumericParsing,
) -> Result<ValidRecord, RecordError> {
    if record.commune_name.is_empty() {
        return Err(RecordError::MissingCommuneName);
    }
    if record.insee_code.is_empty() {
        return Err(RecordError::MissingInseeCode);
    }
    if record.insee_code.chars().count() != 5 {
        return Err(RecordError::InvalidInseeCode(record.insee_code.clone()));
    }
    if record.department_code.is_empty() {
        return Err(RecordError::MissingDepartmentCode);
    }
    if !is_valid_department_code(&record.department_code) {
        return Err(RecordError::InvalidDepartmentCode(
            record.department_code.clone(),
        ));
    }
    if !record.email.is_empty() && !is_valid_email(&record.email) {
        return Err(RecordError::InvalidEmail(record.email.clone()));
    }

    let population = parse_population(&record.population, mode)?;
    let latitude = parse_coordinate(&record.latitude, "latitude", mode)?;
    let longitude = parse_coordinate(&record.longitude, "longitude", mode)?;

    Ok(ValidRecord {
        commune: CommuneUpsert {
            insee_code: record.insee_code.clone(),
            name: record.commune_name.clone(),
            department_code: record.department_code.clone(),
            population,
            postal_codes: parse_postal_codes(&record.postal_code),
            latitude,
            longitude,
        },
        email: Some(record.email.clone()).filter(|e| !e.is_empty()),
        contact_name: Some(record.contact_name.clone()).filter(|n| !n.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lyon() -> MairieRecord {
        MairieRecord {
            commune_name: "Lyon".into(),
            insee_code: "69123".into(),
            department_code: "69".into(),
            population: "515 695".into(),
            email: "mairie@lyon.fr".into(),
            postal_code: "69001,69002".into(),
            latitude: "45,764".into(),
            longitude: "4.8357".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_department_codes_accepted() {
        for code in ["01", "75", "95", "2A", "2B", "971", "978"] {
            assert!(is_valid_department_code(code), "{code} should be valid");
        }
    }

    #[test]
    fn test_department_codes_rejected() {
        for code in ["00", "96", "2C", "970", "979", "", "AB", "1", "075", "+1", "2a", "9 7"] {
            assert!(!is_valid_department_code(code), "{code:?} should be invalid");
        }
    }

    #[test]
    fn test_email_check_is_minimal() {
        assert!(is_valid_email("mairie@lyon.fr"));
        assert!(!is_valid_email("mairie.lyon.fr"));
        assert!(!is_valid_email("mairie@lyon"));
    }

    #[test]
    fn test_valid_record() {
        let valid = validate_record(&lyon(), NumericParsing::Strict).expect("valid");
        assert_eq!(valid.commune.population, 515_695);
        assert_eq!(valid.commune.postal_codes, vec!["69001", "69002"]);
        assert_eq!(valid.commune.latitude, Some(45.764));
        assert_eq!(valid.email.as_deref(), Some("mairie@lyon.fr"));
        assert_eq!(valid.contact_name, None);
    }

    #[test]
    fn test_first_failure_wins() {
        let record = MairieRecord {
            commune_name: String::new(),
            insee_code: "123".into(),
            department_code: "99".into(),
            ..lyon()
        };
        let err = validate_record(&record, NumericParsing::Lenient).unwrap_err();
        assert!(matches!(err, RecordError::MissingCommuneName));

        let record = MairieRecord {
            insee_code: "123".into(),
            department_code: "99".into(),
            ..lyon()
        };
        let err = validate_record(&record, NumericParsing::Lenient).unwrap_err();
        assert_eq!(err.to_string(), "INSEE code must be 5 characters long, got: 123");

        let record = MairieRecord {
            department_code: "99".into(),
            email: "nope".into(),
            ..lyon()
        };
        let err = validate_record(&record, NumericParsing::Lenient).unwrap_err();
        assert_eq!(err.to_string(), "invalid department code: 99");

        let record = MairieRecord {
            email: "nope".into(),
            population: "beaucoup".into(),
            ..lyon()
        };
        let err = validate_record(&record, NumericParsing::Strict).unwrap_err();
        assert!(matches!(err, RecordError::InvalidEmail(_)));
    }

    #[test]
    fn test_numeric_mode() {
        let record = MairieRecord {
            population: "beaucoup".into(),
            latitude: "nord".into(),
            ..lyon()
        };
        let lenient = validate_record(&record, NumericParsing::Lenient).expect("lenient");
        assert_eq!(lenient.commune.population, 0);
        assert_eq!(lenient.commune.latitude, None);

        let err = validate_record(&record, NumericParsing::Strict).unwrap_err();
        assert!(matches!(err, RecordError::InvalidPopulation(_)));
    }
}
