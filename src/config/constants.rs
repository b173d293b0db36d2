//! Configuration constants.

/// Default SQLite database path.
pub const DB_PATH: &str = "./commune_targeting.db";

/// Environment variable overriding the database path.
pub const DB_PATH_ENV: &str = "COMMUNE_TARGETING_DB_PATH";

// Pagination at the caller boundary
/// Default page size for commune listings.
pub const DEFAULT_LIST_LIMIT: u32 = 50;
/// Largest page size accepted for commune listings.
pub const MAX_LIST_LIMIT: u32 = 1000;
/// Default page size for name searches.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;
/// Largest page size accepted for name searches.
pub const MAX_SEARCH_LIMIT: u32 = 100;

/// Number of sample communes returned by a targeting preview.
pub const PREVIEW_SAMPLE_SIZE: u32 = 10;

// CSV import
/// Field delimiter for imported and exported CSV files (French-locale spreadsheets).
pub const CSV_DELIMITER: u8 = b';';
/// Maximum number of error messages kept on an import result.
///
/// Older messages are evicted first; the error counter keeps counting.
pub const MAX_IMPORT_ERRORS: usize = 1000;
/// Largest population accepted for a commune (Paris has about 2.1 million).
///
/// Keeps every population sum well inside `i64`.
pub const MAX_POPULATION: i64 = 100_000_000;
/// Subscriber status written for subscribers created by an import.
pub const SUBSCRIBER_STATUS_ENABLED: &str = "enabled";
/// Contact type stored in the attributes of subscribers created by an import.
pub const MAIRIE_CONTACT_TYPE: &str = "mairie";
