//! Geographic targeting filters.
//!
//! A [`TargetingFilter`] is compiled once into a [`CompiledFilter`], which is
//! then appended to the commune listing, recipient counting and statistics
//! queries so all three see exactly the same set of communes.

mod compiler;
mod params;

use serde::{Deserialize, Serialize};

pub use compiler::{compile, CompiledFilter, FilterValue};
pub use params::{parse_string_list, Pagination};

/// Geographic targeting criteria.
///
/// Dimensions combine with AND; values inside one dimension combine with OR.
/// An empty list (or `None` bound) leaves that dimension unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetingFilter {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub department_codes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population_max: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commune_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub postal_codes: Vec<String>,
}

impl TargetingFilter {
    /// A filter matching only communes whose name contains `fragment`.
    pub fn by_name(fragment: impl Into<String>) -> Self {
        TargetingFilter {
            commune_names: vec![fragment.into()],
            ..Default::default()
        }
    }

    /// Returns `true` when no dimension is constrained.
    pub fn is_empty(&self) -> bool {
        self.department_codes.is_empty()
            && self.population_min.is_none()
            && self.population_max.is_none()
            && self.regions.is_empty()
            && self.commune_names.is_empty()
            && self.postal_codes.is_empty()
    }

    /// Builds a filter from raw request parameters.
    ///
    /// Lists are comma-separated with tokens trimmed and empty tokens dropped.
    /// Population bounds that are not integers are ignored rather than
    /// rejected.
    pub fn from_params(
        department_codes: Option<&str>,
        regions: Option<&str>,
        commune_names: Option<&str>,
        postal_codes: Option<&str>,
        population_min: Option<&str>,
        population_max: Option<&str>,
    ) -> Self {
        TargetingFilter {
            department_codes: department_codes.map(parse_string_list).unwrap_or_default(),
            regions: regions.map(parse_string_list).unwrap_or_default(),
            commune_names: commune_names.map(parse_string_list).unwrap_or_default(),
            postal_codes: postal_codes.map(parse_string_list).unwrap_or_default(),
            population_min: population_min.and_then(|s| s.trim().parse().ok()),
            population_max: population_max.and_then(|s| s.trim().parse().ok()),
        }
    }
}
