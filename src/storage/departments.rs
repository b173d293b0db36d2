//! Department reference data.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error_handling::GeoError;
use crate::storage::models::Department;

/// Lists all departments ordered by code.
pub async fn list_departments(pool: &SqlitePool) -> Result<Vec<Department>, GeoError> {
    let rows = sqlx::query(
        "SELECT id, code, name, region, created_at_ms, updated_at_ms
         FROM departments
         ORDER BY code",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(Department::from_row).collect())
}

/// Looks up a department by code.
pub async fn get_department_by_code<'e, E>(executor: E, code: &str) -> Result<Department, GeoError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "SELECT id, code, name, region, created_at_ms, updated_at_ms
         FROM departments
         WHERE code = ?",
    )
    .bind(code)
    .fetch_optional(executor)
    .await?
    .map(|row| Department::from_row(&row))
    .ok_or_else(|| GeoError::not_found("department", code))
}
