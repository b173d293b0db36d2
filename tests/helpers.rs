// Shared test helpers for database setup and test data creation.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use commune_targeting::run_migrations;

/// Creates a test database pool with migrations applied.
/// Uses a single-connection in-memory database so every query sees the same data.
#[allow(dead_code)] // Used by other test files
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

/// Inserts a subscriber with the given status and returns its id.
#[allow(dead_code)] // Used by other test files
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

/// Links a subscriber to a commune (by INSEE code) without going through the library.
#[allow(dead_code)] // Used by other test files
pub async fn link_by_insee(pool: &SqlitePool, subscriber_id: i64, insee_code: &str) {
    sqlx::query(
        "INSERT INTO subscriber_communes (subscriber_id, commune_id, created_at_ms)
         SELECT ?, id, ? FROM communes WHERE insee_code = ?",
    )
    .bind(subscriber_id)
    .bind(1704067200000i64)
    .bind(insee_code)
    .execute(pool)
    .await
    .expect("Failed to link test subscriber");
}

/// Counts rows of a table.
#[allow(dead_code)] // Used by other test files
pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .expect("Failed to count rows")
}

/// A mairie file with one row per line, using the usual header.
#[allow(dead_code)] // Used by other test files
pub fn mairie_csv(rows: &[&str]) -> String {
    let mut csv = String::from(
        "nom_commune;code_insee;code_departement;population;email;nom_contact;code_postal;latitude;longitude\n",
    );
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    csv
}
