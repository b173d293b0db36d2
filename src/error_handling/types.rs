//! Error type definitions.
//!
//! This module defines all error types used throughout the application.

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for database setup.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),

    /// Schema migration error.
    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

/// Errors returned by the geographic repository and targeting queries.
///
/// `NotFound` means the lookup itself succeeded but matched nothing, which
/// callers report differently from a failed query.
#[derive(Error, Debug)]
pub enum GeoError {
    /// A lookup by code or id matched nothing.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Kind of record looked up ("department", "commune", "subscriber").
        entity: &'static str,
        /// The code or id that was looked up.
        key: String,
    },

    /// The underlying query failed (connection, constraint, syntax).
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// A caller-supplied argument cannot be turned into a query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl GeoError {
    pub(crate) fn not_found(entity: &'static str, key: impl ToString) -> Self {
        GeoError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Returns `true` for the `NotFound` variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GeoError::NotFound { .. })
    }
}

/// Failure of a single CSV record.
///
/// These never abort an import: they are rendered into the run's error list
/// and counted.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("commune name is required")]
    MissingCommuneName,

    #[error("INSEE code is required")]
    MissingInseeCode,

    #[error("INSEE code must be 5 characters long, got: {0}")]
    InvalidInseeCode(String),

    #[error("department code is required")]
    MissingDepartmentCode,

    #[error("invalid department code: {0}")]
    InvalidDepartmentCode(String),

    #[error("invalid email format: {0}")]
    InvalidEmail(String),

    #[error("invalid population value: {0}")]
    InvalidPopulation(String),

    #[error("invalid {axis} value: {value}")]
    InvalidCoordinate { axis: &'static str, value: String },

    #[error("unknown department code: {0}")]
    UnknownDepartment(String),

    #[error("error reading CSV record: {0}")]
    Unreadable(#[from] csv::Error),

    #[error("error importing commune: {0}")]
    Commune(#[source] GeoError),

    #[error("error importing subscriber: {0}")]
    Subscriber(#[source] GeoError),
}

/// Run-level import failures.
///
/// Any of these means nothing from the run was committed.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The header is unreadable or lacks a required column.
    #[error("invalid CSV format: {0}")]
    MalformedInput(String),

    /// The input file could not be opened.
    #[error("error opening CSV file: {0}")]
    Io(#[from] std::io::Error),

    /// Beginning, releasing or committing the run transaction failed.
    #[error("transaction error: {0}")]
    Storage(#[from] sqlx::Error),

    /// The final counters do not add up.
    #[error(
        "inconsistent import tally: total={total}, imported={imported}, errors={errors}, blank={blank}"
    )]
    InconsistentTally {
        total: usize,
        imported: usize,
        errors: usize,
        blank: usize,
    },
}
