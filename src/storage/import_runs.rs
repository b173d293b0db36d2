//! Import run history.
//!
//! One row per committed import, written inside the import transaction.

use serde::Serialize;
use sqlx::{Row, SqliteConnection, SqlitePool};

use crate::error_handling::DatabaseError;

/// Counters of a finished import run, recorded at commit.
pub struct ImportRunStats<'a> {
    pub source: &'a str,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub total_records: usize,
    pub imported_records: usize,
    pub skipped_records: usize,
    pub error_records: usize,
    pub communes_created: usize,
    pub communes_updated: usize,
    pub subscribers_created: usize,
    pub subscribers_linked: usize,
    pub create_subscribers: bool,
}

/// Inserts the run row and returns its id.
pub async fn insert_import_run(
    conn: &mut SqliteConnection,
    stats: &ImportRunStats<'_>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "INSERT INTO import_runs (
            source, start_time_ms, end_time_ms, total_records, imported_records,
            skipped_records, error_records, communes_created, communes_updated,
            subscribers_created, subscribers_linked, create_subscribers
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id",
    )
    .bind(stats.source)
    .bind(stats.start_time_ms)
    .bind(stats.end_time_ms)
    .bind(stats.total_records as i64)
    .bind(stats.imported_records as i64)
    .bind(stats.skipped_records as i64)
    .bind(stats.error_records as i64)
    .bind(stats.communes_created as i64)
    .bind(stats.communes_updated as i64)
    .bind(stats.subscribers_created as i64)
    .bind(stats.subscribers_linked as i64)
    .bind(stats.create_subscribers)
    .fetch_one(&mut *conn)
    .await
}

/// Summary of a committed import run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportRunSummary {
    pub id: i64,
    /// File name or other label of the imported source.
    pub source: String,
    pub start_time_ms: i64,
    pub end_time_ms: i64,
    pub total_records: i64,
    pub imported_records: i64,
    pub skipped_records: i64,
    pub error_records: i64,
    pub communes_created: i64,
    pub communes_updated: i64,
    pub subscribers_created: i64,
    pub subscribers_linked: i64,
    pub create_subscribers: bool,
}

/// Lists committed import runs, most recent first.
pub async fn query_import_history(
    pool: &SqlitePool,
    limit: Option<usize>,
) -> Result<Vec<ImportRunSummary>, DatabaseError> {
    // SQLite treats a negative LIMIT as no limit
    let limit = limit.map(|l| l as i64).unwrap_or(-1);

    let rows = sqlx::query(
        "SELECT id, source, start_time_ms, end_time_ms, total_records, imported_records,
                skipped_records, error_records, communes_created, communes_updated,
                subscribers_created, subscribers_linked, create_subscribers
         FROM import_runs
         ORDER BY start_time_ms DESC, id DESC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    Ok(rows
        .into_iter()
        .map(|row| ImportRunSummary {
            id: row.get("id"),
            source: row.get("source"),
            start_time_ms: row.get("start_time_ms"),
            end_time_ms: row.get("end_time_ms"),
            total_records: row.get("total_records"),
            imported_records: row.get("imported_records"),
            skipped_records: row.get("skipped_records"),
            error_records: row.get("error_records"),
            communes_created: row.get("communes_created"),
            communes_updated: row.get("communes_updated"),
            subscribers_created: row.get("subscribers_created"),
            subscribers_linked: row.get("subscribers_linked"),
            create_subscribers: row.get("create_subscribers"),
        })
        .collect())
}
