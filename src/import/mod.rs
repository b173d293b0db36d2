//! Mairie CSV import.
//!
//! A run moves through these stages:
//! 1. **Header**: columns are mapped by the tokens of their header cell and
//!    the required ones (commune name, INSEE code, department code) checked
//! 2. **Records**: each row is projected, validated, then written (commune
//!    upsert plus optional subscriber) inside its own savepoint
//! 3. **Commit**: the counters are reconciled, the run is recorded in the
//!    import history and the transaction committed (or rolled back for a dry run)
//!
//! Record-level failures end up in [`ImportResult::errors`]; only header,
//! stream and transaction failures abort a run.

mod header;
mod pipeline;
mod record;
mod result;
mod subscriber;
mod validate;

pub use header::{classify, ColumnMap, Field, REQUIRED_FIELDS};
pub use pipeline::{import_mairies, import_mairies_from_path, ImportOptions};
pub use record::{parse_coordinate, parse_population, parse_postal_codes, MairieRecord};
pub use result::{ImportResult, RecordOutcome, SubscriberOutcome};
pub use subscriber::new_mairie_subscriber;
pub use validate::{is_valid_department_code, is_valid_email, validate_record, ValidRecord};
