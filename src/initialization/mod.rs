//! Application initialization.
//!
//! This module provides functions to initialize shared resources:
//! - Logger
//! - Database connection pool with migrations applied

mod logger;

use std::path::Path;

use log::info;

use crate::error_handling::DatabaseError;
use crate::storage::{init_db_pool_with_path, run_migrations, DbPool};

// Re-export public API
pub use logger::init_logger_with;

/// Opens the database at `db_path` and brings its schema up to date.
///
/// The department reference data is seeded by the migrations, so a freshly
/// created database is immediately usable for imports.
pub async fn init_database(db_path: &Path) -> Result<DbPool, DatabaseError> {
    let pool = init_db_pool_with_path(db_path).await?;
    run_migrations(&pool).await?;
    info!("Database ready at {}", db_path.display());
    Ok(pool)
}
