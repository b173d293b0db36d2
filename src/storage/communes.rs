//! Commune queries and upserts.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor};

use crate::error_handling::GeoError;
use crate::filter::{compile, TargetingFilter};
use crate::storage::models::{
    encode_postal_codes, search_key, Commune, CommuneUpsert, UpsertOutcome, UpsertedCommune,
    COMMUNE_COLUMNS,
};

/// Starts a query selecting full commune rows joined with their department.
pub(crate) fn commune_select() -> QueryBuilder<'static, Sqlite> {
    QueryBuilder::new(format!(
        "SELECT {COMMUNE_COLUMNS} FROM communes c \
         LEFT JOIN departments d ON d.code = c.department_code"
    ))
}

/// Lists communes matching `filter`, ordered by name then INSEE code.
///
/// A `limit` of 0 returns every match. That form is meant for internal
/// aggregation; callers facing users go through [`crate::Pagination`],
/// which always yields a bounded limit.
pub async fn list_communes<'e, E>(
    executor: E,
    filter: &TargetingFilter,
    limit: u32,
    offset: u32,
) -> Result<Vec<Commune>, GeoError>
where
    E: SqliteExecutor<'e>,
{
    let compiled = compile(filter);
    let mut query = commune_select();
    query.push(" WHERE ");
    compiled.push_predicate(&mut query);
    query.push(" ORDER BY c.name, c.insee_code");

    if limit > 0 {
        query.push(" LIMIT ");
        query.push_bind(i64::from(limit));
    } else if offset > 0 {
        // SQLite only accepts OFFSET after a LIMIT
        query.push(" LIMIT -1");
    }
    if offset > 0 {
        query.push(" OFFSET ");
        query.push_bind(i64::from(offset));
    }

    let rows = query.build().fetch_all(executor).await?;
    Ok(rows.iter().map(Commune::from_row).collect())
}

/// Looks up a commune by INSEE code.
pub async fn get_commune_by_insee_code<'e, E>(
    executor: E,
    insee_code: &str,
) -> Result<Commune, GeoError>
where
    E: SqliteExecutor<'e>,
{
    let mut query = commune_select();
    query.push(" WHERE c.insee_code = ");
    query.push_bind(insee_code.to_string());

    query
        .build()
        .fetch_optional(executor)
        .await?
        .map(|row| Commune::from_row(&row))
        .ok_or_else(|| GeoError::not_found("commune", insee_code))
}

/// Looks up a commune by id.
pub async fn get_commune_by_id<'e, E>(executor: E, id: i64) -> Result<Commune, GeoError>
where
    E: SqliteExecutor<'e>,
{
    let mut query = commune_select();
    query.push(" WHERE c.id = ");
    query.push_bind(id);

    query
        .build()
        .fetch_optional(executor)
        .await?
        .map(|row| Commune::from_row(&row))
        .ok_or_else(|| GeoError::not_found("commune", id))
}

/// Inserts the commune, or overwrites it when its INSEE code already exists.
///
/// Takes a connection rather than the pool so it runs inside the caller's
/// transaction together with any subscriber link written for the same record.
pub async fn upsert_commune(
    conn: &mut SqliteConnection,
    commune: &CommuneUpsert,
) -> Result<UpsertedCommune, GeoError> {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let postal_codes = encode_postal_codes(&commune.postal_codes);
    let search_name = search_key(&commune.name);

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM communes WHERE insee_code = ?")
        .bind(&commune.insee_code)
        .fetch_optional(&mut *conn)
        .await?;

    if let Some(id) = existing {
        sqlx::query(
            "UPDATE communes
             SET name = ?, search_name = ?, department_code = ?, population = ?,
                 postal_codes = ?, latitude = ?, longitude = ?, updated_at_ms = ?
             WHERE id = ?",
        )
        .bind(&commune.name)
        .bind(&search_name)
        .bind(&commune.department_code)
        .bind(commune.population)
        .bind(&postal_codes)
        .bind(commune.latitude)
        .bind(commune.longitude)
        .bind(now_ms)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        log::debug!("Updated commune {} (id {})", commune.insee_code, id);
        return Ok(UpsertedCommune {
            id,
            outcome: UpsertOutcome::Updated,
        });
    }

    let id: i64 = sqlx::query_scalar(
        "INSERT INTO communes (
            insee_code, name, search_name, department_code, population,
            postal_codes, latitude, longitude, created_at_ms, updated_at_ms
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id",
    )
    .bind(&commune.insee_code)
    .bind(&commune.name)
    .bind(&search_name)
    .bind(&commune.department_code)
    .bind(commune.population)
    .bind(&postal_codes)
    .bind(commune.latitude)
    .bind(commune.longitude)
    .bind(now_ms)
    .bind(now_ms)
    .fetch_one(&mut *conn)
    .await?;

    log::debug!("Inserted commune {} (id {})", commune.insee_code, id);
    Ok(UpsertedCommune {
        id,
        outcome: UpsertOutcome::Inserted,
    })
}
