//! Geographic targeting: recipient counts, previews and statistics.
//!
//! Every operation here compiles the caller's [`TargetingFilter`] with
//! [`crate::filter::compile`] and appends the resulting predicate to its own
//! query. Listing, counting and statistics therefore always agree on which
//! communes a filter selects.

mod buckets;
mod stats;

use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};

use crate::config::{PREVIEW_SAMPLE_SIZE, SUBSCRIBER_STATUS_ENABLED};
use crate::error_handling::GeoError;
use crate::filter::{compile, Pagination, TargetingFilter};
use crate::storage::{list_communes, Commune};

use stats::statistics_in;

pub use buckets::PopulationBucket;
pub use stats::{
    overall_stats, statistics, GeoStats, PopulationRangeStats, RegionStat, TargetingStats,
};

/// Query prefix joining matching communes to their enabled subscribers.
///
/// Followed by the compiled predicate; `s.status` is bound by the caller.
const SUBSCRIBER_JOIN: &str = "FROM communes c \
     LEFT JOIN departments d ON d.code = c.department_code \
     JOIN subscriber_communes sc ON sc.commune_id = c.id \
     JOIN subscribers s ON s.id = sc.subscriber_id \
     WHERE s.status = ";

/// Result of [`preview`].
#[derive(Debug, Clone, Serialize)]
pub struct TargetingPreview {
    /// Distinct enabled subscribers reached by the filter.
    pub count: i64,
    /// The filter as received.
    pub filters: TargetingFilter,
    /// First communes by name, at most [`PREVIEW_SAMPLE_SIZE`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sample_communes: Vec<Commune>,
    pub statistics: TargetingStats,
    pub estimated_reach: i64,
    /// Population of the sample communes only.
    pub population_total: i64,
}

/// Counts distinct enabled subscribers linked to any commune matching `filter`.
pub async fn count_recipients(pool: &SqlitePool, filter: &TargetingFilter) -> Result<i64, GeoError> {
    count_recipients_with(pool, filter).await
}

/// [`count_recipients`] on any executor, so it can share a transaction.
pub(crate) async fn count_recipients_with<'e, E>(
    executor: E,
    filter: &TargetingFilter,
) -> Result<i64, GeoError>
where
    E: SqliteExecutor<'e>,
{
    let compiled = compile(filter);
    let mut query = sqlx::QueryBuilder::new("SELECT COUNT(DISTINCT s.id) ");
    query.push(SUBSCRIBER_JOIN);
    query.push_bind(SUBSCRIBER_STATUS_ENABLED);
    query.push(" AND ");
    compiled.push_predicate(&mut query);

    let count: i64 = query.build_query_scalar().fetch_one(executor).await?;
    log::debug!(
        "Filter with {} clause(s) reaches {} subscriber(s)",
        compiled.clause_count(),
        count
    );
    Ok(count)
}

/// Lists one page of communes matching `filter`.
pub async fn list_communes_page(
    pool: &SqlitePool,
    filter: &TargetingFilter,
    page: Pagination,
) -> Result<Vec<Commune>, GeoError> {
    list_communes(pool, filter, page.limit(), page.offset()).await
}

/// Searches communes whose name contains `query`, ignoring case and accents.
///
/// An empty (or blank) query is rejected with [`GeoError::InvalidQuery`].
pub async fn search_communes(
    pool: &SqlitePool,
    query: &str,
    page: Pagination,
) -> Result<Vec<Commune>, GeoError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(GeoError::InvalidQuery(
            "search query must not be empty".to_string(),
        ));
    }
    list_communes_page(pool, &TargetingFilter::by_name(query), page).await
}

/// Previews a filter: recipient count, a sample of communes and statistics.
///
/// The sample is the first page ordered by name, so identical filters over
/// identical data always yield the same preview. Every part is read inside
/// one transaction and describes the same state of the store.
pub async fn preview(
    pool: &SqlitePool,
    filter: &TargetingFilter,
) -> Result<TargetingPreview, GeoError> {
    let mut tx = pool.begin().await?;
    let count = count_recipients_with(&mut *tx, filter).await?;
    let sample = Pagination::first(PREVIEW_SAMPLE_SIZE);
    let sample_communes = list_communes(&mut *tx, filter, sample.limit(), sample.offset()).await?;
    let statistics = statistics_in(&mut *tx, filter).await?;
    tx.commit().await?;

    let population_total = sample_communes
        .iter()
        .map(|c| i128::from(c.population))
        .sum::<i128>();

    Ok(TargetingPreview {
        count,
        filters: filter.clone(),
        sample_communes,
        statistics,
        estimated_reach: count,
        population_total: saturate(population_total),
    })
}

/// Narrows a population sum to `i64`, saturating instead of wrapping.
fn saturate(total: i128) -> i64 {
    i64::try_from(total).unwrap_or(if total < 0 { i64::MIN } else { i64::MAX })
}
