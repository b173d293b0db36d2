//! commune_targeting library: geographic targeting over French communes
//!
//! This library selects subscribers by French administrative geography
//! (departments, regions, communes, postal codes and population) and imports
//! mairie contact records from semicolon-separated CSV files into a SQLite
//! database.
//!
//! # Example
//!
//! ```no_run
//! use commune_targeting::initialization::init_database;
//! use commune_targeting::{count_recipients, TargetingFilter};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = init_database(std::path::Path::new("./commune_targeting.db")).await?;
//! let filter = TargetingFilter {
//!     department_codes: vec!["2A".into(), "2B".into()],
//!     population_max: Some(5000),
//!     ..Default::default()
//! };
//! let recipients = count_recipients(&pool, &filter).await?;
//! println!("{recipients} subscriber(s) in small Corsican communes");
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod config;
pub mod error_handling;
pub mod export;
pub mod filter;
pub mod import;
pub mod initialization;
pub mod storage;
pub mod targeting;

// Re-export public API
pub use config::{LogFormat, LogLevel, NumericParsing};
pub use error_handling::{DatabaseError, GeoError, ImportError, RecordError};
pub use filter::{Pagination, TargetingFilter};
pub use import::{import_mairies, import_mairies_from_path, ImportOptions, ImportResult};
pub use storage::{query_import_history, run_migrations, Commune, Department, ImportRunSummary};
pub use targeting::{
    count_recipients, overall_stats, preview, search_communes, statistics, GeoStats,
    TargetingPreview, TargetingStats,
};
