//! Header row mapping.
//!
//! Municipal exports name their columns inconsistently ("Nom de la commune",
//! "nom_commune", "NOM COMMUNE"...), so columns are recognized by the tokens
//! their header contains rather than by exact name.

use csv::StringRecord;

/// A field of [`super::MairieRecord`] that a column can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    CommuneName,
    InseeCode,
    DepartmentCode,
    Population,
    Email,
    ContactName,
    PostalCode,
    Latitude,
    Longitude,
}

impl Field {
    /// Canonical column name, as written by the export.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::CommuneName => "nom_commune",
            Field::InseeCode => "code_insee",
            Field::DepartmentCode => "code_departement",
            Field::Population => "population",
            Field::Email => "email",
            Field::ContactName => "nom_contact",
            Field::PostalCode => "code_postal",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

const FIELD_COUNT: usize = 9;

/// Fields without which the import cannot start.
pub const REQUIRED_FIELDS: [Field; 3] = [Field::CommuneName, Field::InseeCode, Field::DepartmentCode];

/// A header matches when it contains every `all_of` token and, if
/// `any_of` is non-empty, at least one `any_of` token.
struct HeaderRule {
    all_of: &'static [&'static str],
    any_of: &'static [&'static str],
    field: Field,
}

impl HeaderRule {
    fn matches(&self, header: &str) -> bool {
        self.all_of.iter().all(|token| header.contains(token))
            && (self.any_of.is_empty() || self.any_of.iter().any(|token| header.contains(token)))
    }
}

// Order matters: "population" contains "lat", "contact_email" contains "contact".
const RULES: &[HeaderRule] = &[
    HeaderRule {
        all_of: &["nom", "commune"],
        any_of: &[],
        field: Field::CommuneName,
    },
    HeaderRule {
        all_of: &["code", "insee"],
        any_of: &[],
        field: Field::InseeCode,
    },
    HeaderRule {
        all_of: &["code", "departement"],
        any_of: &[],
        field: Field::DepartmentCode,
    },
    HeaderRule {
        all_of: &["population"],
        any_of: &[],
        field: Field::Population,
    },
    HeaderRule {
        all_of: &[],
        any_of: &["email", "mail"],
        field: Field::Email,
    },
    HeaderRule {
        all_of: &["nom", "contact"],
        any_of: &[],
        field: Field::ContactName,
    },
    HeaderRule {
        all_of: &["code", "postal"],
        any_of: &[],
        field: Field::PostalCode,
    },
    HeaderRule {
        all_of: &[],
        any_of: &["latitude", "lat"],
        field: Field::Latitude,
    },
    HeaderRule {
        all_of: &[],
        any_of: &["longitude", "lng", "lon"],
        field: Field::Longitude,
    },
];

/// Normalizes a header cell for matching: BOM and surrounding whitespace
/// removed, accents folded, lower-cased.
fn normalize(cell: &str) -> String {
    deunicode::deunicode(cell.trim_start_matches('\u{feff}').trim()).to_lowercase()
}

/// Field recognized for one header cell, if any. The first matching rule wins.
pub fn classify(cell: &str) -> Option<Field> {
    let header = normalize(cell);
    if header.is_empty() {
        return None;
    }
    RULES
        .iter()
        .find(|rule| rule.matches(&header))
        .map(|rule| rule.field)
}

/// Column index of every recognized field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    slots: [Option<usize>; FIELD_COUNT],
}

impl ColumnMap {
    /// Maps a header row. When two cells feed the same field, the leftmost one wins.
    pub fn from_header(header: &StringRecord) -> Self {
        let mut map = ColumnMap::default();
        for (index, cell) in header.iter().enumerate() {
            if let Some(field) = classify(cell) {
                let slot = &mut map.slots[field.slot()];
                if slot.is_none() {
                    *slot = Some(index);
                } else {
                    log::debug!(
                        "Ignoring column {index} ({cell:?}): {} already mapped",
                        field.as_str()
                    );
                }
            }
        }
        map
    }

    pub fn index(&self, field: Field) -> Option<usize> {
        self.slots[field.slot()]
    }

    /// Required fields with no column, in declaration order.
    pub fn missing_required(&self) -> Vec<Field> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| self.index(*field).is_none())
            .collect()
    }

    /// Trimmed cell for `field`, empty when unmapped or past the end of a short row.
    pub fn cell<'r>(&self, record: &'r StringRecord, field: Field) -> &'r str {
        self.index(field)
            .and_then(|index| record.get(index))
            .map(str::trim)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_common_headers() {
        assert_eq!(classify("nom_commune"), Some(Field::CommuneName));
        assert_eq!(classify("Nom de la commune"), Some(Field::CommuneName));
        assert_eq!(classify("CODE_INSEE"), Some(Field::InseeCode));
        assert_eq!(classify("Code département"), Some(Field::DepartmentCode));
        assert_eq!(classify("population"), Some(Field::Population));
        assert_eq!(classify("E-mail"), Some(Field::Email));
        assert_eq!(classify("courriel"), None);
        assert_eq!(classify("nom_contact"), Some(Field::ContactName));
        assert_eq!(classify("Code postal"), Some(Field::PostalCode));
        assert_eq!(classify("lat"), Some(Field::Latitude));
        assert_eq!(classify("Longitude"), Some(Field::Longitude));
        assert_eq!(classify("lng"), Some(Field::Longitude));
        assert_eq!(classify("telephone"), None);
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_rule_order_resolves_overlaps() {
        // "population" contains "lat"
        assert_eq!(classify("Population totale"), Some(Field::Population));
        // email rule precedes the contact-name rule
        assert_eq!(classify("email_contact"), Some(Field::Email));
        // "nom_commune_contact" matches both name rules; the commune one comes first
        assert_eq!(classify("nom_commune_contact"), Some(Field::CommuneName));
    }

    #[test]
    fn test_bom_is_ignored() {
        assert_eq!(classify("\u{feff}nom_commune"), Some(Field::CommuneName));
    }

    #[test]
    fn test_leftmost_duplicate_wins() {
        let header = StringRecord::from(vec!["email", "code_insee", "mail_secondaire", "nom_commune"]);
        let map = ColumnMap::from_header(&header);
        assert_eq!(map.index(Field::Email), Some(0));
        assert_eq!(map.index(Field::InseeCode), Some(1));
        assert_eq!(map.index(Field::CommuneName), Some(3));
        assert_eq!(map.missing_required(), vec![Field::DepartmentCode]);
    }

    #[test]
    fn test_cell_handles_short_rows() {
        let header = StringRecord::from(vec!["nom_commune", "code_insee", "code_departement", "email"]);
        let map = ColumnMap::from_header(&header);
        assert!(map.missing_required().is_empty());

        let row = StringRecord::from(vec!["  Lyon ", "69123", "69"]);
        assert_eq!(map.cell(&row, Field::CommuneName), "Lyon");
        assert_eq!(map.cell(&row, Field::Email), "");
        assert_eq!(map.cell(&row, Field::Latitude), "");
    }
}
