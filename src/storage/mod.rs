// storage/mod.rs
// Database operations module: typed queries over departments, communes,
// subscribers and their links. No business rules live here.

pub mod communes;
pub mod departments;
pub mod import_runs;
pub mod links;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod subscribers;
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use communes::{
    get_commune_by_id, get_commune_by_insee_code, list_communes, upsert_commune,
};
pub use departments::{get_department_by_code, list_departments};
pub use import_runs::{insert_import_run, query_import_history, ImportRunStats, ImportRunSummary};
pub use links::{
    link_subscriber_to_commune, list_communes_for_subscriber, unlink_subscriber_from_commune,
};
pub use migrations::run_migrations;
pub use models::{
    Commune, CommuneUpsert, Department, NewSubscriber, UpsertOutcome, UpsertedCommune,
};
pub use pool::{init_db_pool_with_path, DbPool};
pub use subscribers::{create_subscriber, find_subscriber_by_email, subscriber_exists};
