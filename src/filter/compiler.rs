//! Compilation of a [`TargetingFilter`] into a SQL predicate.
//!
//! The predicate refers to two aliases that every base query must provide:
//!
//! ```sql
//! FROM communes c
//! LEFT JOIN departments d ON d.code = c.department_code
//! ```
//!
//! Clauses are always emitted in the same order (departments, population
//! bounds, regions, names, postal codes) and parameters follow the order of
//! their placeholders, so one filter yields one predicate no matter which
//! query it is appended to.

use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite};

use super::TargetingFilter;
use crate::storage::models::search_key;

/// A positional parameter bound into the predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Sql(&'static str),
    Bind(FilterValue),
}

/// One AND-ed condition, made of SQL text and bound values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Clause {
    parts: Vec<Part>,
}

impl Clause {
    fn sql(mut self, text: &'static str) -> Self {
        self.parts.push(Part::Sql(text));
        self
    }

    fn bind(mut self, value: FilterValue) -> Self {
        self.parts.push(Part::Bind(value));
        self
    }

    /// Appends `(?, ?, ...)` binding every value.
    fn bind_list<'a>(mut self, values: impl IntoIterator<Item = &'a String>) -> Self {
        self.parts.push(Part::Sql("("));
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.parts.push(Part::Sql(", "));
            }
            self.parts.push(Part::Bind(FilterValue::Text(value.clone())));
        }
        self.parts.push(Part::Sql(")"));
        self
    }
}

/// The compiled form of a [`TargetingFilter`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompiledFilter {
    clauses: Vec<Clause>,
}

/// Predicate used when the filter constrains nothing.
const TAUTOLOGY: &str = "1 = 1";

impl CompiledFilter {
    /// Returns `true` when the predicate matches every commune.
    pub fn is_tautology(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Number of AND-ed clauses.
    pub fn clause_count(&self) -> usize {
        self.clauses.len()
    }

    /// Renders the predicate with `?` placeholders.
    pub fn to_sql(&self) -> String {
        if self.clauses.is_empty() {
            return TAUTOLOGY.to_string();
        }
        let mut sql = String::new();
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            for part in &clause.parts {
                match part {
                    Part::Sql(text) => sql.push_str(text),
                    Part::Bind(_) => sql.push('?'),
                }
            }
        }
        sql
    }

    /// Parameters in placeholder order.
    pub fn params(&self) -> Vec<&FilterValue> {
        self.clauses
            .iter()
            .flat_map(|clause| clause.parts.iter())
            .filter_map(|part| match part {
                Part::Bind(value) => Some(value),
                Part::Sql(_) => None,
            })
            .collect()
    }

    /// Appends the predicate to `builder`, binding every parameter.
    ///
    /// The caller is responsible for the preceding `WHERE` or `AND`.
    pub fn push_predicate(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        if self.clauses.is_empty() {
            builder.push(TAUTOLOGY);
            return;
        }
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                builder.push(" AND ");
            }
            for part in &clause.parts {
                match part {
                    Part::Sql(text) => {
                        builder.push(*text);
                    }
                    Part::Bind(FilterValue::Text(value)) => {
                        builder.push_bind(value.clone());
                    }
                    Part::Bind(FilterValue::Integer(value)) => {
                        builder.push_bind(*value);
                    }
                }
            }
        }
    }
}

/// Compiles `filter` into a predicate over `c` (communes) and `d` (departments).
pub fn compile(filter: &TargetingFilter) -> CompiledFilter {
    let mut clauses = Vec::new();

    if !filter.department_codes.is_empty() {
        clauses.push(
            Clause::default()
                .sql("c.department_code IN ")
                .bind_list(&filter.department_codes),
        );
    }

    if let Some(min) = filter.population_min {
        clauses.push(
            Clause::default()
                .sql("c.population >= ")
                .bind(FilterValue::Integer(min)),
        );
    }

    if let Some(max) = filter.population_max {
        clauses.push(
            Clause::default()
                .sql("c.population <= ")
                .bind(FilterValue::Integer(max)),
        );
    }

    if !filter.regions.is_empty() {
        clauses.push(Clause::default().sql("d.region IN ").bind_list(&filter.regions));
    }

    if !filter.commune_names.is_empty() {
        let mut clause = Clause::default().sql("(");
        for (i, name) in filter.commune_names.iter().enumerate() {
            if i > 0 {
                clause = clause.sql(" OR ");
            }
            clause = clause
                .sql("c.search_name LIKE ")
                .bind(FilterValue::Text(like_pattern(name)))
                .sql(" ESCAPE '\\'");
        }
        clauses.push(clause.sql(")"));
    }

    if !filter.postal_codes.is_empty() {
        clauses.push(
            Clause::default()
                .sql("EXISTS (SELECT 1 FROM json_each(c.postal_codes) pc WHERE pc.value IN ")
                .bind_list(&filter.postal_codes)
                .sql(")"),
        );
    }

    CompiledFilter { clauses }
}

/// `%fragment%` over the folded name, with LIKE metacharacters escaped.
fn like_pattern(fragment: &str) -> String {
    let folded = search_key(fragment.trim());
    let mut pattern = String::with_capacity(folded.len() + 2);
    pattern.push('%');
    for ch in folded.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
