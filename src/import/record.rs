//! Row projection and numeric cell parsing.

use csv::StringRecord;

use super::header::{ColumnMap, Field};
use crate::config::{NumericParsing, MAX_POPULATION};
use crate::error_handling::RecordError;

/// One CSV row, projected onto the recognized columns.
///
/// Values are trimmed but otherwise raw; parsing happens during validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MairieRecord {
    pub commune_name: String,
    pub insee_code: String,
    pub department_code: String,
    pub population: String,
    pub email: String,
    pub contact_name: String,
    pub postal_code: String,
    pub latitude: String,
    pub longitude: String,
}

impl MairieRecord {
    pub fn from_record(record: &StringRecord, columns: &ColumnMap) -> Self {
        let cell = |field| columns.cell(record, field).to_string();
        MairieRecord {
            commune_name: cell(Field::CommuneName),
            insee_code: cell(Field::InseeCode),
            department_code: cell(Field::DepartmentCode),
            population: cell(Field::Population),
            email: cell(Field::Email),
            contact_name: cell(Field::ContactName),
            postal_code: cell(Field::PostalCode),
            latitude: cell(Field::Latitude),
            longitude: cell(Field::Longitude),
        }
    }

    /// Returns `true` when every mapped cell is empty.
    pub fn is_blank(&self) -> bool {
        [
            &self.commune_name,
            &self.insee_code,
            &self.department_code,
            &self.population,
            &self.email,
            &self.contact_name,
            &self.postal_code,
            &self.latitude,
            &self.longitude,
        ]
        .iter()
        .all(|value| value.is_empty())
    }
}

/// Parses a population cell.
///
/// Spaces (including the narrow and non-breaking ones French spreadsheets
/// emit) and thousands-separator commas are stripped first. An empty cell is
/// 0 in both modes. Values above [`MAX_POPULATION`] are treated like
/// unparsable ones.
pub fn parse_population(raw: &str, mode: NumericParsing) -> Result<i64, RecordError> {
    let digits: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if digits.is_empty() {
        return Ok(0);
    }
    match digits.parse::<i64>() {
        Ok(population) if (0..=MAX_POPULATION).contains(&population) => Ok(population),
        _ => match mode {
            NumericParsing::Lenient => {
                log::debug!("Treating population {raw:?} as 0");
                Ok(0)
            }
            NumericParsing::Strict => Err(RecordError::InvalidPopulation(raw.to_string())),
        },
    }
}

/// Parses a latitude or longitude cell, accepting a comma decimal separator.
///
/// An empty cell is unset in both modes.
pub fn parse_coordinate(
    raw: &str,
    axis: &'static str,
    mode: NumericParsing,
) -> Result<Option<f64>, RecordError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => match mode {
            NumericParsing::Lenient => {
                log::debug!("Leaving {axis} {raw:?} unset");
                Ok(None)
            }
            NumericParsing::Strict => Err(RecordError::InvalidCoordinate {
                axis,
                value: raw.to_string(),
            }),
        },
    }
}

/// Splits a postal code cell on commas, trimming and dropping empty entries.
pub fn parse_postal_codes(raw: &str) -> Vec<String> {
    crate::filter::parse_string_list(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_separators() {
        assert_eq!(parse_population("12 345", NumericParsing::Lenient).unwrap(), 12_345);
        assert_eq!(parse_population("2,161,000", NumericParsing::Strict).unwrap(), 2_161_000);
        assert_eq!(parse_population("1\u{a0}500", NumericParsing::Strict).unwrap(), 1_500);
        assert_eq!(parse_population("1\u{202f}500", NumericParsing::Strict).unwrap(), 1_500);
        assert_eq!(parse_population("", NumericParsing::Strict).unwrap(), 0);
    }

    #[test]
    fn test_population_lenient_vs_strict() {
        assert_eq!(parse_population("n/a", NumericParsing::Lenient).unwrap(), 0);
        assert_eq!(parse_population("-12", NumericParsing::Lenient).unwrap(), 0);

        let err = parse_population("n/a", NumericParsing::Strict).unwrap_err();
        assert_eq!(err.to_string(), "invalid population value: n/a");
        assert!(parse_population("-12", NumericParsing::Strict).is_err());
    }

    #[test]
    fn test_population_ceiling() {
        assert_eq!(
            parse_population("100 000 000", NumericParsing::Strict).unwrap(),
            MAX_POPULATION
        );
        assert_eq!(
            parse_population("5000000000000000000", NumericParsing::Lenient).unwrap(),
            0
        );
        let err = parse_population("100000001", NumericParsing::Strict).unwrap_err();
        assert_eq!(err.to_string(), "invalid population value: 100000001");
    }

    #[test]
    fn test_coordinates() {
        assert_eq!(
            parse_coordinate("48,8566", "latitude", NumericParsing::Strict).unwrap(),
            Some(48.8566)
        );
        assert_eq!(
            parse_coordinate("2.3522", "longitude", NumericParsing::Strict).unwrap(),
            Some(2.3522)
        );
        assert_eq!(parse_coordinate(" ", "latitude", NumericParsing::Strict).unwrap(), None);
        assert_eq!(
            parse_coordinate("nord", "latitude", NumericParsing::Lenient).unwrap(),
            None
        );
        assert_eq!(
            parse_coordinate("NaN", "latitude", NumericParsing::Lenient).unwrap(),
            None
        );

        let err = parse_coordinate("nord", "latitude", NumericParsing::Strict).unwrap_err();
        assert_eq!(err.to_string(), "invalid latitude value: nord");
    }

    #[test]
    fn test_postal_codes() {
        assert_eq!(parse_postal_codes("75001, 75002,,"), vec!["75001", "75002"]);
        assert!(parse_postal_codes("").is_empty());
    }

    #[test]
    fn test_blank_record() {
        assert!(MairieRecord::default().is_blank());
        let record = MairieRecord {
            email: "x@y.fr".into(),
            ..Default::default()
        };
        assert!(!record.is_blank());
    }
}
