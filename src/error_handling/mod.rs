//! Error handling.
//!
//! Errors are split along the propagation policy:
//! - **Run-level** (`ImportError`, `DatabaseError`, `InitializationError`):
//!   abort the operation and reach the caller
//! - **Lookup/query** (`GeoError`): `NotFound` is kept distinct from storage failures
//! - **Record-level** (`RecordError`): captured into the import result, never propagated

mod types;

// Re-export public API
pub use types::{DatabaseError, GeoError, ImportError, InitializationError, RecordError};
