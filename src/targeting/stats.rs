//! Aggregated statistics over communes and their subscribers.

use std::collections::{BTreeMap, HashMap, HashSet};

use futures::TryStreamExt;
use serde::Serialize;
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use strum::IntoEnumIterator;

use super::buckets::PopulationBucket;
use super::{count_recipients_with, SUBSCRIBER_JOIN};
use crate::config::SUBSCRIBER_STATUS_ENABLED;
use crate::error_handling::GeoError;
use crate::filter::{compile, TargetingFilter};

/// Statistics over the communes matching a filter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TargetingStats {
    pub total_communes: i64,
    /// Distinct enabled subscribers, as returned by `count_recipients`.
    pub total_subscribers: i64,
    pub by_department: BTreeMap<String, i64>,
    /// Communes whose department has no region are left out.
    pub by_region: BTreeMap<String, i64>,
    /// Non-empty buckets only, keyed by label.
    pub by_population_range: BTreeMap<String, i64>,
    pub average_population: f64,
    /// Every bucket in ascending order, including empty ones.
    pub population_ranges: Vec<PopulationRangeStats>,
}

/// One population bucket within [`TargetingStats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationRangeStats {
    pub range: String,
    pub min: i64,
    pub max: Option<i64>,
    pub count: i64,
    pub subscribers: i64,
}

/// Unfiltered coverage and population statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GeoStats {
    pub total_departments: i64,
    pub total_communes: i64,
    pub total_subscribers: i64,

    pub communes_with_subscribers: i64,
    pub coverage_percentage: f64,

    pub total_population: i64,
    pub average_population: f64,
    pub median_population: i64,

    pub region_stats: Vec<RegionStat>,
}

/// Per-region breakdown within [`GeoStats`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionStat {
    pub region: String,
    pub departments: i64,
    pub communes: i64,
    pub subscribers: i64,
    pub total_population: i64,
    pub coverage_percent: f64,
}

/// Share of `covered` in `total` as a percentage, 0 when `total` is 0.
fn percentage(covered: i64, total: i64) -> f64 {
    if total > 0 {
        covered as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// Computes statistics for the communes matching `filter`.
///
/// Commune rows are streamed and folded, never collected. All reads run in
/// one transaction, so the commune totals and the subscriber count describe
/// the same state of the store even while an import is committing.
pub async fn statistics(
    pool: &SqlitePool,
    filter: &TargetingFilter,
) -> Result<TargetingStats, GeoError> {
    let mut tx = pool.begin().await?;
    let stats = statistics_in(&mut *tx, filter).await?;
    tx.commit().await?;
    Ok(stats)
}

/// [`statistics`] on a connection the caller already holds, typically
/// inside its own transaction.
pub(crate) async fn statistics_in(
    conn: &mut SqliteConnection,
    filter: &TargetingFilter,
) -> Result<TargetingStats, GeoError> {
    let compiled = compile(filter);
    let mut stats = TargetingStats::default();
    let mut bucket_counts: HashMap<PopulationBucket, i64> = HashMap::new();
    let mut total_population: i128 = 0;

    let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(
        "SELECT c.department_code, d.region, c.population FROM communes c \
         LEFT JOIN departments d ON d.code = c.department_code WHERE ",
    );
    compiled.push_predicate(&mut query);

    let mut rows = query.build().fetch(&mut *conn);
    while let Some(row) = rows.try_next().await? {
        let department_code: String = row.get("department_code");
        let region: Option<String> = row.get("region");
        let population: i64 = row.get("population");

        stats.total_communes += 1;
        total_population += i128::from(population);
        *stats.by_department.entry(department_code).or_insert(0) += 1;
        if let Some(region) = region.filter(|r| !r.is_empty()) {
            *stats.by_region.entry(region).or_insert(0) += 1;
        }
        *bucket_counts
            .entry(PopulationBucket::for_population(population))
            .or_insert(0) += 1;
    }
    drop(rows);

    if stats.total_communes > 0 {
        stats.average_population = total_population as f64 / stats.total_communes as f64;
    }

    let mut bucket_subscribers: HashMap<PopulationBucket, HashSet<i64>> = HashMap::new();
    let mut query: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new("SELECT c.population, s.id AS subscriber_id ");
    query.push(SUBSCRIBER_JOIN);
    query.push_bind(SUBSCRIBER_STATUS_ENABLED);
    query.push(" AND ");
    compiled.push_predicate(&mut query);

    let mut rows = query.build().fetch(&mut *conn);
    while let Some(row) = rows.try_next().await? {
        let population: i64 = row.get("population");
        let subscriber_id: i64 = row.get("subscriber_id");
        bucket_subscribers
            .entry(PopulationBucket::for_population(population))
            .or_default()
            .insert(subscriber_id);
    }
    drop(rows);

    for bucket in PopulationBucket::iter() {
        let count = bucket_counts.get(&bucket).copied().unwrap_or(0);
        if count > 0 {
            stats
                .by_population_range
                .insert(bucket.as_str().to_string(), count);
        }
        stats.population_ranges.push(PopulationRangeStats {
            range: bucket.as_str().to_string(),
            min: bucket.lower_bound(),
            max: bucket.upper_bound(),
            count,
            subscribers: bucket_subscribers.get(&bucket).map_or(0, |s| s.len() as i64),
        });
    }

    stats.total_subscribers = count_recipients_with(&mut *conn, filter).await?;
    Ok(stats)
}

/// Computes coverage and population statistics over every commune.
///
/// Region figures come from separate grouped queries merged by region name,
/// so no join multiplies population sums by subscriber links.
pub async fn overall_stats(pool: &SqlitePool) -> Result<GeoStats, GeoError> {
    let mut stats = GeoStats {
        total_departments: sqlx::query_scalar("SELECT COUNT(*) FROM departments")
            .fetch_one(pool)
            .await?,
        total_communes: sqlx::query_scalar("SELECT COUNT(*) FROM communes")
            .fetch_one(pool)
            .await?,
        total_subscribers: sqlx::query_scalar("SELECT COUNT(*) FROM subscribers WHERE status = ?")
            .bind(SUBSCRIBER_STATUS_ENABLED)
            .fetch_one(pool)
            .await?,
        ..Default::default()
    };

    stats.communes_with_subscribers = sqlx::query_scalar(
        "SELECT COUNT(DISTINCT c.id) FROM communes c
         JOIN subscriber_communes sc ON sc.commune_id = c.id
         JOIN subscribers s ON s.id = sc.subscriber_id
         WHERE s.status = ?",
    )
    .bind(SUBSCRIBER_STATUS_ENABLED)
    .fetch_one(pool)
    .await?;
    stats.coverage_percentage = percentage(stats.communes_with_subscribers, stats.total_communes);

    // TOTAL() sums as a float and cannot overflow the way SUM() does
    let total_population: f64 = sqlx::query_scalar("SELECT TOTAL(population) FROM communes")
        .fetch_one(pool)
        .await?;
    stats.total_population = total_population as i64;
    if stats.total_communes > 0 {
        stats.average_population = total_population / stats.total_communes as f64;
    }

    // Upper median: the element at index n / 2 of the sorted populations
    let median: Option<i64> =
        sqlx::query_scalar("SELECT population FROM communes ORDER BY population LIMIT 1 OFFSET ?")
            .bind(stats.total_communes / 2)
            .fetch_optional(pool)
            .await?;
    stats.median_population = median.unwrap_or(0);

    stats.region_stats = region_stats(pool).await?;
    Ok(stats)
}

async fn region_stats(pool: &SqlitePool) -> Result<Vec<RegionStat>, GeoError> {
    let mut regions: BTreeMap<String, RegionStat> = BTreeMap::new();

    let rows = sqlx::query("SELECT region, COUNT(*) AS departments FROM departments GROUP BY region")
        .fetch_all(pool)
        .await?;
    for row in rows {
        let region: String = row.get("region");
        regions.insert(
            region.clone(),
            RegionStat {
                region,
                departments: row.get("departments"),
                ..Default::default()
            },
        );
    }

    let rows = sqlx::query(
        "SELECT d.region, COUNT(*) AS communes, TOTAL(c.population) AS total_population
         FROM communes c
         JOIN departments d ON d.code = c.department_code
         GROUP BY d.region",
    )
    .fetch_all(pool)
    .await?;
    for row in rows {
        let region: String = row.get("region");
        if let Some(stat) = regions.get_mut(&region) {
            stat.communes = row.get("communes");
            stat.total_population = row.get::<f64, _>("total_population") as i64;
        }
    }

    let rows = sqlx::query(
        "SELECT d.region,
                COUNT(DISTINCT s.id) AS subscribers,
                COUNT(DISTINCT c.id) AS covered
         FROM communes c
         JOIN departments d ON d.code = c.department_code
         JOIN subscriber_communes sc ON sc.commune_id = c.id
         JOIN subscribers s ON s.id = sc.subscriber_id
         WHERE s.status = ?
         GROUP BY d.region",
    )
    .bind(SUBSCRIBER_STATUS_ENABLED)
    .fetch_all(pool)
    .await?;
    let mut covered: HashMap<String, i64> = HashMap::new();
    for row in rows {
        let region: String = row.get("region");
        if let Some(stat) = regions.get_mut(&region) {
            stat.subscribers = row.get("subscribers");
        }
        covered.insert(region, row.get("covered"));
    }

    Ok(regions
        .into_values()
        .map(|mut stat| {
            let covered_communes = covered.get(&stat.region).copied().unwrap_or(0);
            stat.coverage_percent = percentage(covered_communes, stat.communes);
            stat
        })
        .collect())
}
