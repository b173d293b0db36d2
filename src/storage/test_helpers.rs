//! Shared test helpers for storage module tests.
//!
//! This module provides common utilities for database setup and test data creation
//! used across unit tests.

#[cfg(test)]
use sqlx::sqlite::SqlitePoolOptions;
#[cfg(test)]
use sqlx::SqlitePool;

#[cfg(test)]
use crate::storage::models::CommuneUpsert;
#[cfg(test)]
use crate::storage::{run_migrations, upsert_commune};

/// Creates a test database pool with migrations applied.
/// Uses a single-connection in-memory database so every query sees the same data.
#[cfg(test)]
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Upserts a commune and returns its id.
#[cfg(test)]
pub async fn insert_commune(
    pool: &SqlitePool,
    insee_code: &str,
    name: &str,
    department_code: &str,
    population: i64,
    postal_codes: &[&str],
) -> i64 {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    upsert_commune(
        &mut conn,
        &CommuneUpsert {
            insee_code: insee_code.to_string(),
            name: name.to_string(),
            department_code: department_code.to_string(),
            population,
            postal_codes: postal_codes.iter().map(|s| s.to_string()).collect(),
            latitude: None,
            longitude: None,
        },
    )
    .await
    .expect("Failed to insert test commune")
    .id
}

/// Inserts a subscriber with the given status and returns its id.
#[cfg(test)]
pub async fn insert_subscriber(pool: &SqlitePool, email: &str, status: &str) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO subscribers (uuid, email, name, attribs, status, created_at_ms)
         VALUES (?, ?, ?, '{}', ?, ?)
         RETURNING id",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(email)
    .bind(email)
    .bind(status)
    .bind(1704067200000i64)
    .fetch_one(pool)
    .await
    .expect("Failed to insert test subscriber")
}

/// Links a subscriber to a commune without existence checks.
#[cfg(test)]
pub async fn link(pool: &SqlitePool, subscriber_id: i64, commune_id: i64) {
    sqlx::query(
        "INSERT INTO subscriber_communes (subscriber_id, commune_id, created_at_ms) VALUES (?, ?, ?)",
    )
    .bind(subscriber_id)
    .bind(commune_id)
    .bind(1704067200000i64)
    .execute(pool)
    .await
    .expect("Failed to link test subscriber");
}
