//! Database row models.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// A French department (reference data).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub region: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Department {
    pub(crate) fn from_row(row: &SqliteRow) -> Self {
        Department {
            id: row.get("id"),
            code: row.get("code"),
            name: row.get("name"),
            region: row.get("region"),
            created_at_ms: row.get("created_at_ms"),
            updated_at_ms: row.get("updated_at_ms"),
        }
    }
}

/// A French commune, joined with its department name and region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commune {
    pub id: i64,
    pub insee_code: String,
    pub name: String,
    pub department_code: String,
    pub population: i64,
    pub postal_codes: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Column list matching [`Commune::from_row`].
///
/// Expects `communes c LEFT JOIN departments d ON d.code = c.department_code`.
pub(crate) const COMMUNE_COLUMNS: &str = "c.id, c.insee_code, c.name, c.department_code, \
     c.population, c.postal_codes, c.latitude, c.longitude, c.created_at_ms, c.updated_at_ms, \
     d.name AS department_name, d.region AS region";

impl Commune {
    pub(crate) fn from_row(row: &SqliteRow) -> Self {
        let postal_codes_json: String = row.get("postal_codes");
        let postal_codes = decode_postal_codes(&postal_codes_json);
        Commune {
            id: row.get("id"),
            insee_code: row.get("insee_code"),
            name: row.get("name"),
            department_code: row.get("department_code"),
            population: row.get("population"),
            postal_codes,
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
            created_at_ms: row.get("created_at_ms"),
            updated_at_ms: row.get("updated_at_ms"),
            department_name: row.get("department_name"),
            region: row.get("region"),
        }
    }
}

/// Values written by [`crate::storage::upsert_commune`].
///
/// Everything except `insee_code` is overwritten when the commune exists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommuneUpsert {
    pub insee_code: String,
    pub name: String,
    pub department_code: String,
    pub population: i64,
    pub postal_codes: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Whether an upsert created or overwrote the commune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Result of [`crate::storage::upsert_commune`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertedCommune {
    pub id: i64,
    pub outcome: UpsertOutcome,
}

/// A new subscriber as created by the import.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscriber {
    pub email: String,
    pub name: String,
    pub attribs: serde_json::Value,
    pub status: String,
}

pub(crate) fn encode_postal_codes(codes: &[String]) -> String {
    // Serializing a slice of strings cannot fail
    serde_json::to_string(codes).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn decode_postal_codes(json: &str) -> Vec<String> {
    match serde_json::from_str(json) {
        Ok(codes) => codes,
        Err(e) => {
            log::warn!("Ignoring malformed postal_codes value {json:?}: {e}");
            Vec::new()
        }
    }
}

/// ASCII-folded, lower-cased form of a commune name, stored for searching.
pub(crate) fn search_key(name: &str) -> String {
    deunicode::deunicode(name).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postal_codes_keep_order() {
        let codes = vec!["75004".to_string(), "75001".to_string()];
        let json = encode_postal_codes(&codes);
        assert_eq!(json, r#"["75004","75001"]"#);
        assert_eq!(decode_postal_codes(&json), codes);
    }

    #[test]
    fn test_malformed_postal_codes_decode_to_empty() {
        assert!(decode_postal_codes("75001").is_empty());
    }

    #[test]
    fn test_search_key_folds_accents_and_case() {
        assert_eq!(search_key("Besançon"), "besancon");
        assert_eq!(search_key("L'Haÿ-les-Roses"), "l'hay-les-roses");
        assert_eq!(search_key("ÉVRY"), "evry");
    }
}
